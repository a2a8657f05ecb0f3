//! Validation rules for numeric cells.

use crate::validation::error::{Violation, ViolationType};

/// "The Null Rule": every observation must carry a real number.
pub(crate) fn validate_finite(index: usize, column: &str, value: f64) -> Option<Violation> {
    if value.is_finite() {
        return None;
    }
    Some(Violation {
        index,
        violation_type: ViolationType::NonFinite,
        message: format!("Column '{}' holds non-finite value {} at row {}", column, value, index),
    })
}

/// "The Interval Rule": bounds must bracket the point estimate.
pub(crate) fn validate_interval(index: usize, lower: f64, point: f64, upper: f64) -> Option<Violation> {
    if lower <= point && point <= upper {
        return None;
    }
    Some(Violation {
        index,
        violation_type: ViolationType::BoundsOrder,
        message: format!(
            "Row {} violates lower <= point <= upper ({} <= {} <= {})",
            index, lower, point, upper
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn test_non_finite_rejected(#[case] value: f64) {
        let v = validate_finite(0, "value", value).unwrap();
        assert_eq!(v.violation_type, ViolationType::NonFinite);
    }

    #[rstest]
    #[case(1.0, 2.0, 3.0, true)]
    #[case(2.0, 2.0, 2.0, true)]
    #[case(2.5, 2.0, 3.0, false)]
    #[case(1.0, 3.5, 3.0, false)]
    #[case(f64::NAN, 2.0, 3.0, false)]
    fn test_interval(#[case] lo: f64, #[case] p: f64, #[case] hi: f64, #[case] ok: bool) {
        assert_eq!(validate_interval(7, lo, p, hi).is_none(), ok);
    }
}

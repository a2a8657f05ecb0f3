//! Point-forecast accuracy metrics over joined (actual, predicted) pairs.

pub const MAE: &str = "MAE";
pub const RMSE: &str = "RMSE";
pub const MAPE: &str = "MAPE";
pub const R2: &str = "R2";

/// Column order used wherever metrics are tabulated.
pub const ALL: [&str; 4] = [MAE, RMSE, MAPE, R2];

pub fn mae(pairs: &[(f64, f64)]) -> f64 {
    pairs.iter().map(|(a, p)| (a - p).abs()).sum::<f64>() / pairs.len() as f64
}

pub fn rmse(pairs: &[(f64, f64)]) -> f64 {
    (pairs.iter().map(|(a, p)| (a - p).powi(2)).sum::<f64>() / pairs.len() as f64).sqrt()
}

/// Mean absolute percentage error in percent. `None` if any actual is zero.
pub fn mape(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.iter().any(|(a, _)| *a == 0.0) {
        return None;
    }
    Some(pairs.iter().map(|(a, p)| ((a - p) / a).abs()).sum::<f64>() / pairs.len() as f64 * 100.0)
}

/// Coefficient of determination. `None` when the actuals are constant.
///
/// Constancy is tested on the values themselves: the rounded mean of a
/// constant series such as 0.1 leaves a tiny non-zero `ss_tot`.
pub fn r2(pairs: &[(f64, f64)]) -> Option<f64> {
    let first = pairs.first()?.0;
    if pairs.iter().all(|(a, _)| *a == first) {
        return None;
    }
    let mean = pairs.iter().map(|(a, _)| a).sum::<f64>() / pairs.len() as f64;
    let ss_tot: f64 = pairs.iter().map(|(a, _)| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return None;
    }
    let ss_res: f64 = pairs.iter().map(|(a, p)| (a - p).powi(2)).sum();
    Some(1.0 - ss_res / ss_tot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const PAIRS: [(f64, f64); 4] = [(10.0, 12.0), (20.0, 18.0), (30.0, 33.0), (40.0, 40.0)];

    #[test]
    fn test_known_values() {
        assert_relative_eq!(mae(&PAIRS), 7.0 / 4.0);
        assert_relative_eq!(rmse(&PAIRS), (17.0_f64 / 4.0).sqrt());
        assert_relative_eq!(mape(&PAIRS).unwrap(), (0.2 + 0.1 + 0.1 + 0.0) / 4.0 * 100.0, epsilon = 1e-12);
        // mean 25, ss_tot 500, ss_res 17
        assert_relative_eq!(r2(&PAIRS).unwrap(), 1.0 - 17.0 / 500.0);
    }

    #[test]
    fn test_zero_actual_has_no_mape() {
        assert!(mape(&[(0.0, 1.0), (2.0, 2.0)]).is_none());
    }

    #[test]
    fn test_constant_actuals_have_no_r2() {
        assert!(r2(&[(3.0, 1.0), (3.0, 4.0)]).is_none());
        assert!(r2(&[(0.1, 0.2), (0.1, 0.0), (0.1, 0.1)]).is_none());
        assert!(r2(&[]).is_none());
    }
}

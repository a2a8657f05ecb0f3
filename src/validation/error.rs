//! Defines the violation types reported by the validation module.

/// The specific category of an invariant violation.
///
// This enum allows for programmatic inspection of violations, which is more
// robust than string matching on the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationType {
    /// Fewer rows than the minimum a stage can work with.
    TooShort,
    /// A timestamp equal to its predecessor.
    DuplicateTimestamp,
    /// A timestamp earlier than its predecessor.
    OutOfOrder,
    /// A NaN or infinite value.
    NonFinite,
    /// A forecast row whose bounds do not bracket its point estimate.
    BoundsOrder,
}

/// A structured report of one broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Row position where the violation was detected.
    pub index: usize,
    /// The category of the violation.
    pub violation_type: ViolationType,
    /// A human-readable message explaining the violation.
    pub message: String,
}

/// Joins a list of violations into a single line for error messages.
pub fn summarize(violations: &[Violation]) -> String {
    const SHOWN: usize = 5;
    let mut parts: Vec<String> = violations
        .iter()
        .take(SHOWN)
        .map(|v| v.message.clone())
        .collect();
    if violations.len() > SHOWN {
        parts.push(format!("... and {} more", violations.len() - SHOWN));
    }
    parts.join("; ")
}

//! Validation rule for timestamp ordering.

use crate::validation::error::{Violation, ViolationType};
use chrono::NaiveDateTime;

/// "The Calendar Rule": each timestamp must be strictly later than the one before it.
///
/// Duplicates are reported separately from reversals so ingestion can tell a
/// repeated row apart from an unsorted source.
pub(crate) fn validate_ordering(
    index: usize,
    previous: NaiveDateTime,
    current: NaiveDateTime,
) -> Option<Violation> {
    if current == previous {
        return Some(Violation {
            index,
            violation_type: ViolationType::DuplicateTimestamp,
            message: format!("Duplicate timestamp {} at row {}", current, index),
        });
    }
    if current < previous {
        return Some(Violation {
            index,
            violation_type: ViolationType::OutOfOrder,
            message: format!(
                "Timestamp {} at row {} precedes {} at row {}",
                current,
                index,
                previous,
                index - 1
            ),
        });
    }
    None
}

//! The central validator that runs every frame invariant rule.
use super::error::{Violation, ViolationType};
use super::rules::{temporal, values};
use chrono::NaiveDateTime;

/// The checker guarding every stage boundary.
///
/// It holds borrowed columns of a frame and walks them once, applying each
/// registered rule row by row. Like a linter, it collects every violation
/// instead of stopping at the first one.
pub struct Validator<'a> {
    timestamps: &'a [NaiveDateTime],
    min_rows: usize,
    columns: Vec<(&'a str, &'a [f64])>,
    intervals: Option<(&'a [f64], &'a [f64], &'a [f64])>,
}

impl<'a> Validator<'a> {
    pub fn new(timestamps: &'a [NaiveDateTime]) -> Self {
        Self { timestamps, min_rows: 0, columns: Vec::new(), intervals: None }
    }

    pub fn min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows;
        self
    }

    /// Registers a numeric column that must be finite on every row.
    pub fn column(mut self, name: &'a str, data: &'a [f64]) -> Self {
        self.columns.push((name, data));
        self
    }

    /// Registers interval columns that must satisfy `lower <= point <= upper`.
    pub fn intervals(mut self, lower: &'a [f64], point: &'a [f64], upper: &'a [f64]) -> Self {
        self.intervals = Some((lower, point, upper));
        self
    }

    /// Executes all registered rules.
    ///
    /// # Returns
    /// - `Ok(())` if no violations are found.
    /// - `Err(Vec<Violation>)` containing every violation discovered.
    pub fn validate(&self) -> Result<(), Vec<Violation>> {
        let mut errors = Vec::new();
        let rows = self.timestamps.len();

        if rows < self.min_rows {
            errors.push(Violation {
                index: rows,
                violation_type: ViolationType::TooShort,
                message: format!("Expected at least {} rows, found {}", self.min_rows, rows),
            });
        }

        for (name, data) in &self.columns {
            if data.len() != rows {
                errors.push(Violation {
                    index: data.len().min(rows),
                    violation_type: ViolationType::TooShort,
                    message: format!("Column '{}' has {} rows, expected {}", name, data.len(), rows),
                });
            }
        }

        for i in 0..rows {
            if i > 0 {
                if let Some(err) = temporal::validate_ordering(i, self.timestamps[i - 1], self.timestamps[i]) {
                    errors.push(err);
                }
            }

            for (name, data) in &self.columns {
                if let Some(err) = data.get(i).and_then(|&v| values::validate_finite(i, name, v)) {
                    errors.push(err);
                }
            }

            if let Some((lower, point, upper)) = self.intervals {
                if let (Some(&l), Some(&p), Some(&u)) = (lower.get(i), point.get(i), upper.get(i)) {
                    if let Some(err) = values::validate_interval(i, l, p, u) {
                        errors.push(err);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

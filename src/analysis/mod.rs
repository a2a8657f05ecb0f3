//! Forecast evaluation against observed values.
mod evaluator;
pub mod metrics;

pub use evaluator::{EvaluationRecord, Evaluator, ResidualRow};

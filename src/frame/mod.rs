//! The data contract exchanged between stages.
pub mod forecast;
pub mod frequency;
pub mod series;

pub use forecast::{ForecastFrame, ForecastRow};
pub use frequency::Frequency;
pub use series::{TimeSeriesFrame, MIN_OBSERVATIONS};

use super::frequency::Frequency;
use crate::error::{PipelineError, Result};
use crate::validation::{summarize, Validator};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A model cannot be fit on fewer observations.
pub const MIN_OBSERVATIONS: usize = 2;

/// Columnar storage shared by serialization and construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SeriesColumns {
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

/// An immutable, validated univariate series.
///
/// Timestamps are strictly increasing, values are finite and there are at
/// least two observations. The only way to obtain a frame is through
/// [`TimeSeriesFrame::new`] (or deserialization, which runs the same checks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesColumns", into = "SeriesColumns")]
pub struct TimeSeriesFrame {
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl TimeSeriesFrame {
    pub fn new(timestamps: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self> {
        Validator::new(&timestamps)
            .min_rows(MIN_OBSERVATIONS)
            .column("value", &values)
            .validate()
            .map_err(|errs| PipelineError::SchemaMismatch(summarize(&errs)))?;
        Ok(Self { timestamps, values })
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (NaiveDateTime, f64)>) -> Result<Self> {
        let (timestamps, values) = pairs.into_iter().unzip();
        Self::new(timestamps, values)
    }

    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
    pub fn timestamps(&self) -> &[NaiveDateTime] { &self.timestamps }
    pub fn values(&self) -> &[f64] { &self.values }

    // Construction guarantees at least two rows, so indexing is safe.
    pub fn first_timestamp(&self) -> NaiveDateTime { self.timestamps[0] }
    pub fn last_timestamp(&self) -> NaiveDateTime { self.timestamps[self.timestamps.len() - 1] }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    pub fn infer_frequency(&self) -> Option<Frequency> {
        Frequency::infer(&self.timestamps)
    }

    pub fn min_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

impl TryFrom<SeriesColumns> for TimeSeriesFrame {
    type Error = PipelineError;

    fn try_from(cols: SeriesColumns) -> Result<Self> {
        Self::new(cols.timestamps, cols.values)
    }
}

impl From<TimeSeriesFrame> for SeriesColumns {
    fn from(frame: TimeSeriesFrame) -> Self {
        Self { timestamps: frame.timestamps, values: frame.values }
    }
}

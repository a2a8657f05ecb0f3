use super::frequency::Frequency;
use super::series::TimeSeriesFrame;
use crate::error::{PipelineError, Result};
use crate::validation::{summarize, Validator};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One predicted timestamp with its uncertainty interval and optional decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub timestamp: NaiveDateTime,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
    /// Seasonal component name -> contribution at this timestamp.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub seasonal: BTreeMap<String, f64>,
}

impl ForecastRow {
    pub fn new(timestamp: NaiveDateTime, point: f64, lower: f64, upper: f64) -> Self {
        Self { timestamp, point, lower, upper, trend: None, seasonal: BTreeMap::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ForecastColumns {
    cutoff: NaiveDateTime,
    rows: Vec<ForecastRow>,
}

/// Engine output: the training timestamps followed by the forecast horizon.
///
/// `cutoff` is the last observed timestamp of the training frame. Rows at or
/// before it form the in-sample portion used for evaluation; rows after it are
/// the genuine forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ForecastColumns", into = "ForecastColumns")]
pub struct ForecastFrame {
    cutoff: NaiveDateTime,
    rows: Vec<ForecastRow>,
}

impl ForecastFrame {
    /// Validates ordering, finiteness and `lower <= point <= upper` on every row.
    pub fn new(cutoff: NaiveDateTime, rows: Vec<ForecastRow>) -> Result<Self> {
        let stamps: Vec<NaiveDateTime> = rows.iter().map(|r| r.timestamp).collect();
        let point: Vec<f64> = rows.iter().map(|r| r.point).collect();
        let lower: Vec<f64> = rows.iter().map(|r| r.lower).collect();
        let upper: Vec<f64> = rows.iter().map(|r| r.upper).collect();

        Validator::new(&stamps)
            .min_rows(1)
            .column("point", &point)
            .column("lower", &lower)
            .column("upper", &upper)
            .intervals(&lower, &point, &upper)
            .validate()
            .map_err(|errs| PipelineError::InvalidForecast(summarize(&errs)))?;

        Ok(Self { cutoff, rows })
    }

    pub fn cutoff(&self) -> NaiveDateTime { self.cutoff }
    pub fn rows(&self) -> &[ForecastRow] { &self.rows }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    fn split_index(&self) -> usize {
        self.rows.partition_point(|r| r.timestamp <= self.cutoff)
    }

    /// Rows at or before the cutoff.
    pub fn in_sample(&self) -> &[ForecastRow] {
        &self.rows[..self.split_index()]
    }

    /// Rows strictly after the cutoff.
    pub fn future(&self) -> &[ForecastRow] {
        &self.rows[self.split_index()..]
    }

    /// Names of the seasonal components present in the decomposition.
    pub fn component_names(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|r| r.seasonal.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Checks the engine output contract against the frame it was fit on.
    ///
    /// The first `input.len()` timestamps must match the input exactly, followed
    /// by `horizon` rows each one `frequency` step after the previous one.
    pub fn conforms_to(&self, input: &TimeSeriesFrame, horizon: usize, frequency: Frequency) -> Result<()> {
        let expected_len = input.len() + horizon;
        if self.rows.len() != expected_len {
            return Err(PipelineError::InvalidForecast(format!(
                "Expected {} rows ({} history + {} horizon), got {}",
                expected_len,
                input.len(),
                horizon,
                self.rows.len()
            )));
        }
        if self.cutoff != input.last_timestamp() {
            return Err(PipelineError::InvalidForecast(format!(
                "Cutoff {} does not match last observation {}",
                self.cutoff,
                input.last_timestamp()
            )));
        }
        if let Some(i) = self
            .rows
            .iter()
            .zip(input.timestamps())
            .position(|(row, ts)| row.timestamp != *ts)
        {
            return Err(PipelineError::InvalidForecast(format!(
                "In-sample timestamp {} at row {} does not match input {}",
                self.rows[i].timestamp,
                i,
                input.timestamps()[i]
            )));
        }
        let expected_future = frequency.extend_series(input.timestamps(), horizon).ok_or_else(|| {
            PipelineError::InvalidForecast("Forecast horizon overflows the calendar".to_string())
        })?;
        let actual_future = self.rows[input.len()..].iter().map(|r| r.timestamp);
        if !actual_future.eq(expected_future.iter().copied()) {
            return Err(PipelineError::InvalidForecast(format!(
                "Future timestamps are not a contiguous {} extension",
                frequency
            )));
        }
        Ok(())
    }
}

impl TryFrom<ForecastColumns> for ForecastFrame {
    type Error = PipelineError;

    fn try_from(cols: ForecastColumns) -> Result<Self> {
        Self::new(cols.cutoff, cols.rows)
    }
}

impl From<ForecastFrame> for ForecastColumns {
    fn from(frame: ForecastFrame) -> Self {
        Self { cutoff: frame.cutoff, rows: frame.rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 5, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn input() -> TimeSeriesFrame {
        TimeSeriesFrame::from_pairs(vec![(day(1), 10.0), (day(2), 11.0), (day(3), 12.0)]).unwrap()
    }

    fn rows(days: &[u32]) -> Vec<ForecastRow> {
        days.iter().map(|&d| ForecastRow::new(day(d), d as f64, d as f64 - 1.0, d as f64 + 1.0)).collect()
    }

    #[test]
    fn test_bounds_violation_rejected() {
        let mut bad = rows(&[1, 2]);
        bad[1].lower = 5.0;
        let err = ForecastFrame::new(day(2), bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidForecast);
    }

    #[test]
    fn test_split_in_sample_and_future() {
        let frame = ForecastFrame::new(day(3), rows(&[1, 2, 3, 4, 5])).unwrap();
        assert_eq!(frame.in_sample().len(), 3);
        assert_eq!(frame.future().len(), 2);
        assert_eq!(frame.future()[0].timestamp, day(4));
    }

    #[test]
    fn test_conforms_to_contract() {
        let frame = ForecastFrame::new(day(3), rows(&[1, 2, 3, 4, 5])).unwrap();
        assert!(frame.conforms_to(&input(), 2, Frequency::Daily).is_ok());
        assert!(frame.conforms_to(&input(), 3, Frequency::Daily).is_err());
    }

    #[test]
    fn test_conforms_detects_gap_in_extension() {
        let frame = ForecastFrame::new(day(3), rows(&[1, 2, 3, 4, 6])).unwrap();
        let err = frame.conforms_to(&input(), 2, Frequency::Daily).unwrap_err();
        assert!(err.to_string().contains("contiguous"));
    }

    #[test]
    fn test_conforms_detects_shifted_history() {
        let frame = ForecastFrame::new(day(3), rows(&[1, 3, 4, 5, 6])).unwrap();
        assert!(frame.conforms_to(&input(), 2, Frequency::Daily).is_err());
    }
}

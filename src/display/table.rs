//! CSV tables written next to the charts.

use crate::analysis::{metrics, EvaluationRecord};
use crate::error::{PipelineError, Result};
use super::format_timestamp;
use crate::frame::ForecastFrame;

fn csv_error(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Render(format!("csv: {}", e))
}

/// Rounds half away from zero, then prints exactly `digits` decimals.
fn rounded(value: f64, digits: u32) -> String {
    let scale = 10f64.powi(digits as i32);
    format!("{:.*}", digits as usize, (value * scale).round() / scale)
}

/// Future rows only: date, forecast, lower and upper bound.
///
/// Bound headers carry the interval percentage, e.g. `Lower Bound (80%)`.
pub fn future_forecast_csv(
    forecast: &ForecastFrame,
    interval_width: f64,
    round_digits: u32,
    date_format: &str,
) -> Result<String> {
    let pct = (interval_width * 100.0).round() as u32;
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record([
        "Date".to_string(),
        "Forecast".to_string(),
        format!("Lower Bound ({}%)", pct),
        format!("Upper Bound ({}%)", pct),
    ])
    .map_err(csv_error)?;

    for row in forecast.future() {
        w.write_record([
            format_timestamp(row.timestamp, date_format)?,
            rounded(row.point, round_digits),
            rounded(row.lower, round_digits),
            rounded(row.upper, round_digits),
        ])
        .map_err(csv_error)?;
    }
    finish(w)
}

/// One header row (MAE,RMSE,MAPE,R2) and one value row; undefined metrics are empty.
pub fn metrics_csv(evaluation: &EvaluationRecord) -> Result<String> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(metrics::ALL).map_err(csv_error)?;
    let values = metrics::ALL.map(|name| {
        let v = evaluation.metric(name);
        if v.is_finite() {
            v.to_string()
        } else {
            String::new()
        }
    });
    w.write_record(&values).map_err(csv_error)?;
    finish(w)
}

fn finish(w: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = w.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(csv_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ForecastRow;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn month(m: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(1960, m, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_future_table_skips_history_and_rounds() {
        let rows = vec![
            ForecastRow::new(month(11), 390.2, 380.0, 400.0),
            ForecastRow::new(month(12), 432.6, 410.4, 455.5001),
        ];
        let forecast = ForecastFrame::new(month(11), rows).unwrap();
        let text = future_forecast_csv(&forecast, 0.8, 0, "%b %Y").unwrap();
        assert_eq!(text, "Date,Forecast,Lower Bound (80%),Upper Bound (80%)\nDec 1960,433,410,456\n");
    }

    #[test]
    fn test_unrenderable_date_format_is_render_error() {
        let rows = vec![
            ForecastRow::new(month(11), 390.0, 380.0, 400.0),
            ForecastRow::new(month(12), 430.0, 410.0, 450.0),
        ];
        let forecast = ForecastFrame::new(month(11), rows).unwrap();
        for pattern in ["%Q", "%Y %z"] {
            let err = future_forecast_csv(&forecast, 0.8, 0, pattern).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::Render);
        }
    }

    #[test]
    fn test_metrics_table_leaves_nan_empty() {
        let mut values = BTreeMap::new();
        values.insert("MAE".to_string(), 1.5);
        values.insert("RMSE".to_string(), 2.0);
        values.insert("MAPE".to_string(), f64::NAN);
        values.insert("R2".to_string(), 0.25);
        let record = EvaluationRecord { metrics: values, residuals: vec![], warnings: vec![] };
        assert_eq!(metrics_csv(&record).unwrap(), "MAE,RMSE,MAPE,R2\n1.5,2,,0.25\n");
    }
}

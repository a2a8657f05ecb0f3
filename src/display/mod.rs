//! Human-facing output: charts, tables and run summaries.
mod charts;
mod table;
pub mod trace;

pub use table::{future_forecast_csv, metrics_csv};

use crate::analysis::EvaluationRecord;
use crate::config::ReportConfig;
use crate::error::{PipelineError, Result};
use crate::frame::{ForecastFrame, TimeSeriesFrame};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FORECAST_PLOT: &str = "forecast.svg";
pub const COMPONENTS_PLOT: &str = "components.svg";
pub const FIT_PLOT: &str = "forecast_vs_actual.svg";
pub const FORECAST_TABLE: &str = "future_forecast_table.csv";
pub const METRICS_TABLE: &str = "metrics.csv";

/// Formats `ts` with a user-supplied strftime pattern.
///
/// Patterns chrono cannot render for a naive timestamp (`%z`, unknown
/// specifiers) fail with `Render` instead of panicking.
pub(crate) fn format_timestamp(ts: NaiveDateTime, pattern: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", ts.format(pattern))
        .map_err(|_| PipelineError::Render(format!("date format '{}' cannot render {}", pattern, ts)))?;
    Ok(out)
}

/// The files a reporter wrote, relative to `output_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportManifest {
    pub output_dir: PathBuf,
    pub files: Vec<String>,
}

impl ReportManifest {
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.files.iter().map(|f| self.output_dir.join(f))
    }
}

/// Renders the outputs of a finished run.
pub trait Reporter {
    fn render(
        &self,
        actual: &TimeSeriesFrame,
        forecast: &ForecastFrame,
        evaluation: &EvaluationRecord,
    ) -> Result<ReportManifest>;
}

/// Writes SVG charts and CSV tables into one directory.
#[derive(Debug, Clone)]
pub struct SvgReporter {
    config: ReportConfig,
    interval_width: f64,
}

impl SvgReporter {
    pub fn new(config: ReportConfig, interval_width: f64) -> Self {
        Self { config, interval_width }
    }

    fn write(&self, dir: &Path, name: &str, contents: &str) -> Result<()> {
        let path = dir.join(name);
        fs::write(&path, contents)
            .map_err(|e| PipelineError::Io(format!("cannot write {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "report file written");
        Ok(())
    }
}

impl Reporter for SvgReporter {
    fn render(
        &self,
        actual: &TimeSeriesFrame,
        forecast: &ForecastFrame,
        evaluation: &EvaluationRecord,
    ) -> Result<ReportManifest> {
        let cfg = &self.config;
        let dir = &cfg.output_dir;
        format_timestamp(forecast.cutoff(), &cfg.date_format)?;
        fs::create_dir_all(dir).map_err(|e| PipelineError::Io(format!("cannot create {}: {}", dir.display(), e)))?;

        // Everything is rendered before the first write.
        let mut outputs = vec![
            (FORECAST_PLOT, charts::forecast_svg(actual, forecast, cfg)?),
            (FIT_PLOT, charts::fit_svg(forecast, evaluation, cfg)?),
            (
                FORECAST_TABLE,
                future_forecast_csv(forecast, self.interval_width, cfg.round_digits, &cfg.date_format)?,
            ),
            (METRICS_TABLE, metrics_csv(evaluation)?),
        ];
        if !forecast.component_names().is_empty() || forecast.rows().iter().any(|r| r.trend.is_some()) {
            outputs.insert(1, (COMPONENTS_PLOT, charts::components_svg(forecast, cfg)?));
        }

        let mut files = Vec::with_capacity(outputs.len());
        for (name, contents) in &outputs {
            self.write(dir, name, contents)?;
            files.push(name.to_string());
        }
        Ok(ReportManifest { output_dir: dir.clone(), files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Evaluator;
    use crate::config::ModelConfig;
    use crate::engine::{ForecastAdapter, HarmonicEngine};
    use crate::frame::Frequency;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn fitted() -> (TimeSeriesFrame, ForecastFrame, EvaluationRecord) {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut stamps = vec![start];
        stamps.extend(Frequency::Monthly.extend(start, 35).unwrap());
        let values = (0..36).map(|i| 50.0 + i as f64 + 5.0 * ((i % 12) as f64 - 5.5).abs()).collect();
        let frame = TimeSeriesFrame::new(stamps, values).unwrap();

        let engine = HarmonicEngine;
        let (_, forecast) = ForecastAdapter::new(&engine)
            .fit_predict(&frame, 6, Frequency::Monthly, &ModelConfig::default())
            .unwrap();
        let evaluation = Evaluator::default().evaluate(&frame, &forecast).unwrap();
        (frame, forecast, evaluation)
    }

    #[test]
    fn test_svg_reporter_writes_all_files() {
        let (frame, forecast, evaluation) = fitted();
        let dir = tempdir().unwrap();
        let cfg = ReportConfig { output_dir: dir.path().join("viz"), ..Default::default() };
        let manifest = SvgReporter::new(cfg, 0.8).render(&frame, &forecast, &evaluation).unwrap();

        assert_eq!(manifest.files, vec![FORECAST_PLOT, COMPONENTS_PLOT, FIT_PLOT, FORECAST_TABLE, METRICS_TABLE]);
        for path in manifest.paths() {
            assert!(path.is_file(), "{} missing", path.display());
        }
        let svg = fs::read_to_string(dir.path().join("viz").join(FORECAST_PLOT)).unwrap();
        assert!(svg.contains("<svg"));
        let table = fs::read_to_string(dir.path().join("viz").join(FORECAST_TABLE)).unwrap();
        assert_eq!(table.lines().count(), 7);
    }

    #[test]
    fn test_unrenderable_date_format_fails_before_writing() {
        let (frame, forecast, evaluation) = fitted();
        let dir = tempdir().unwrap();
        let cfg = ReportConfig {
            output_dir: dir.path().join("viz"),
            date_format: "%b %Y %z".to_string(),
            ..Default::default()
        };
        let err = SvgReporter::new(cfg, 0.8).render(&frame, &forecast, &evaluation).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Render);
        assert!(!dir.path().join("viz").exists());
    }
}

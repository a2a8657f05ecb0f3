//! Pipeline configuration, loaded from JSON and overridable from the CLI.
//!
//! Every tunable is an explicit field here; nothing is read from global state.
//! Defaults reproduce the airline-passengers training run: monthly data, a
//! 24 period horizon, multiplicative yearly seasonality.

use crate::error::{PipelineError, Result};
use crate::frame::Frequency;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE: &str =
    "https://raw.githubusercontent.com/jbrownlee/Datasets/master/airline-passengers.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalityMode {
    Additive,
    #[default]
    Multiplicative,
}

/// How the evaluator treats MAPE when an actual value is exactly zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MapePolicy {
    /// Report MAPE as NaN and record a warning; other metrics are unaffected.
    #[default]
    NanWithWarning,
    /// Fail the evaluation with `DivisionByZeroMetric`.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// URL (`http://`, `https://`) or filesystem path.
    pub location: String,
    pub timestamp_column: Option<String>,
    pub value_column: Option<String>,
    pub delimiter: char,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_SOURCE.to_string(),
            timestamp_column: None,
            value_column: None,
            delimiter: ',',
        }
    }
}

/// Options handed to the forecasting engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub yearly_seasonality: bool,
    pub weekly_seasonality: bool,
    pub daily_seasonality: bool,
    pub seasonality_mode: SeasonalityMode,
    /// Confidence level of the lower/upper bounds, in (0, 1).
    pub interval_width: f64,
    /// Trend flexibility. Larger values allow sharper rate changes.
    pub changepoint_prior_scale: f64,
    /// Seasonality flexibility. Larger values allow larger seasonal swings.
    pub seasonality_prior_scale: f64,
    pub n_changepoints: usize,
    /// Fraction of the history in which changepoints may be placed.
    pub changepoint_range: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            yearly_seasonality: true,
            weekly_seasonality: false,
            daily_seasonality: false,
            seasonality_mode: SeasonalityMode::Multiplicative,
            interval_width: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            n_changepoints: 25,
            changepoint_range: 0.8,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        for (name, value) in [
            ("changepoint_prior_scale", self.changepoint_prior_scale),
            ("seasonality_prior_scale", self.seasonality_prior_scale),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationConfig {
    pub mape_policy: MapePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub title: String,
    pub value_label: String,
    /// Decimal places kept in the forecast table. Zero rounds to whole units.
    pub round_digits: u32,
    /// `chrono` format string for the table's date column.
    pub date_format: String,
    pub width: u32,
    pub height: u32,
}

impl ReportConfig {
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(PipelineError::InvalidConfig(format!(
                "date_format '{}' is not a valid strftime pattern",
                self.date_format
            )));
        }
        Ok(())
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("results/visualizations"),
            title: "Forecast".to_string(),
            value_label: "Value".to_string(),
            round_digits: 0,
            date_format: "%b %Y".to_string(),
            width: 1200,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Artifact store namespace. Concurrent runs must use distinct ids.
    pub run_id: String,
    pub source: SourceConfig,
    pub horizon: usize,
    pub frequency: Frequency,
    pub model: ModelConfig,
    pub evaluation: EvaluationConfig,
    pub artifact_root: PathBuf,
    pub report: ReportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            run_id: "default".to_string(),
            source: SourceConfig::default(),
            horizon: 24,
            frequency: Frequency::Monthly,
            model: ModelConfig::default(),
            evaluation: EvaluationConfig::default(),
            artifact_root: PathBuf::from("artifacts"),
            report: ReportConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| PipelineError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| PipelineError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(PipelineError::InvalidConfig("horizon must be a positive integer".to_string()));
        }
        let id_ok = !self.run_id.is_empty()
            && self.run_id != "."
            && self.run_id != ".."
            && self
                .run_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !id_ok {
            return Err(PipelineError::InvalidConfig(format!(
                "run_id '{}' must be a non-empty name of [A-Za-z0-9._-]",
                self.run_id
            )));
        }
        if !self.source.delimiter.is_ascii() {
            return Err(PipelineError::InvalidConfig(format!(
                "delimiter '{}' must be a single ASCII character",
                self.source.delimiter
            )));
        }
        self.report.validate()?;
        self.model.validate()
    }
}

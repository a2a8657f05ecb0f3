//! Error taxonomy shared by every stage of the pipeline.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The machine-inspectable category of a `PipelineError`.
///
// Recorded in the pipeline report so callers can branch on the failure
// without string matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    SourceUnavailable,
    SchemaMismatch,
    IrregularFrequency,
    InvalidSeasonalityMode,
    FitDivergence,
    InsufficientHistory,
    EmptyJoin,
    DivisionByZeroMetric,
    ArtifactNotFound,
    InvalidForecast,
    InvalidConfig,
    Io,
    Render,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("Irregular frequency: {0}")]
    IrregularFrequency(String),
    #[error("Invalid seasonality mode: {0}")]
    InvalidSeasonalityMode(String),
    #[error("Fit did not converge: {0}")]
    FitDivergence(String),
    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),
    #[error("Empty join: {0}")]
    EmptyJoin(String),
    #[error("Division by zero while computing metric '{metric}'")]
    DivisionByZeroMetric { metric: String },
    #[error("Artifact not found for stage '{stage}': {reason}")]
    ArtifactNotFound { stage: String, reason: String },
    #[error("Invalid forecast: {0}")]
    InvalidForecast(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Render error: {0}")]
    Render(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            PipelineError::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            PipelineError::IrregularFrequency(_) => ErrorKind::IrregularFrequency,
            PipelineError::InvalidSeasonalityMode(_) => ErrorKind::InvalidSeasonalityMode,
            PipelineError::FitDivergence(_) => ErrorKind::FitDivergence,
            PipelineError::InsufficientHistory(_) => ErrorKind::InsufficientHistory,
            PipelineError::EmptyJoin(_) => ErrorKind::EmptyJoin,
            PipelineError::DivisionByZeroMetric { .. } => ErrorKind::DivisionByZeroMetric,
            PipelineError::ArtifactNotFound { .. } => ErrorKind::ArtifactNotFound,
            PipelineError::InvalidForecast(_) => ErrorKind::InvalidForecast,
            PipelineError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            PipelineError::Io(_) => ErrorKind::Io,
            PipelineError::Render(_) => ErrorKind::Render,
        }
    }

    pub fn artifact_not_found(stage: impl fmt::Display, reason: impl Into<String>) -> Self {
        PipelineError::ArtifactNotFound { stage: stage.to_string(), reason: reason.into() }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let err = PipelineError::artifact_not_found("forecast", "missing file");
        assert_eq!(err.kind(), ErrorKind::ArtifactNotFound);
        assert!(err.to_string().contains("'forecast'"));

        let err = PipelineError::DivisionByZeroMetric { metric: "MAPE".into() };
        assert_eq!(err.kind(), ErrorKind::DivisionByZeroMetric);
        assert_eq!(err.kind().to_string(), "DivisionByZeroMetric");
    }

    #[test]
    fn test_io_errors_map_to_io_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PipelineError = io.into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}

use crate::error::{ErrorKind, PipelineError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A unit of pipeline work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Ingest,
    Fit,
    Evaluate,
    Visualize,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Ingest, Stage::Fit, Stage::Evaluate, Stage::Visualize];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ingest => "ingest",
            Stage::Fit => "fit",
            Stage::Evaluate => "evaluate",
            Stage::Visualize => "visualize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Where a run is. Transitions are linear; `Failed` and `Done` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Ingest,
    Fit,
    Evaluate,
    Visualize,
    Done,
    Failed { stage: Stage, kind: ErrorKind, message: String },
}

impl PipelineState {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Ingest => Some(Stage::Ingest),
            PipelineState::Fit => Some(Stage::Fit),
            PipelineState::Evaluate => Some(Stage::Evaluate),
            PipelineState::Visualize => Some(Stage::Visualize),
            PipelineState::Done | PipelineState::Failed { .. } => None,
        }
    }

    /// The state after `stage` succeeds.
    pub fn after(stage: Stage) -> Self {
        match stage {
            Stage::Ingest => PipelineState::Fit,
            Stage::Fit => PipelineState::Evaluate,
            Stage::Evaluate => PipelineState::Visualize,
            Stage::Visualize => PipelineState::Done,
        }
    }

    pub fn failed(stage: Stage, err: &PipelineError) -> Self {
        PipelineState::Failed { stage, kind: err.kind(), message: err.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageStatus {
    Ok,
    Err { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
    pub elapsed: Duration,
}

impl StageOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, StageStatus::Ok)
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub state: PipelineState,
    pub stages: Vec<StageOutcome>,
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn success(&self) -> bool {
        self.state == PipelineState::Done
    }

    /// The stage that failed, with its error kind.
    pub fn failure(&self) -> Option<(Stage, ErrorKind)> {
        match &self.state {
            PipelineState::Failed { stage, kind, .. } => Some((*stage, *kind)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_linear() {
        let mut state = PipelineState::Ingest;
        let mut seen = Vec::new();
        while let Some(stage) = state.stage() {
            seen.push(stage);
            state = PipelineState::after(stage);
        }
        assert_eq!(seen, Stage::ALL.to_vec());
        assert_eq!(state, PipelineState::Done);
    }
}

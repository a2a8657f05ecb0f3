//! Forecasting engines and the adapter that enforces their contract.
mod adapter;
mod harmonic;
mod kernel;
mod model;

pub use adapter::ForecastAdapter;
pub use harmonic::{HarmonicEngine, ENGINE_NAME};
pub use model::{FittedModel, SeasonalBlock};

use crate::config::ModelConfig;
use crate::error::{PipelineError, Result};
use crate::frame::{ForecastFrame, Frequency, TimeSeriesFrame};
use serde::{Deserialize, Serialize};

/// A fitted model as the pipeline sees it: the engine that produced it and
/// its parameters in engine-defined JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHandle {
    pub engine: String,
    pub parameters: serde_json::Value,
}

impl ModelHandle {
    pub fn from_model<M: Serialize>(engine: &str, model: &M) -> Result<Self> {
        let parameters = serde_json::to_value(model)
            .map_err(|e| PipelineError::FitDivergence(format!("model is not serializable: {}", e)))?;
        Ok(Self { engine: engine.to_string(), parameters })
    }

    /// Recovers the harmonic model parameters, if this handle holds them.
    pub fn harmonic(&self) -> Option<FittedModel> {
        if self.engine != ENGINE_NAME {
            return None;
        }
        serde_json::from_value(self.parameters.clone()).ok()
    }
}

/// The narrow contract between the pipeline and a forecasting library.
///
/// Implementations fit on `frame` and return rows for every input timestamp
/// followed by `horizon` future periods. Numerical failures surface as
/// `FitDivergence`. Callers go through [`ForecastAdapter`], which validates
/// inputs before and outputs after.
pub trait ForecastEngine: Send + Sync {
    fn name(&self) -> &str;

    fn fit_predict(
        &self,
        frame: &TimeSeriesFrame,
        horizon: usize,
        frequency: Frequency,
        config: &ModelConfig,
    ) -> Result<(ModelHandle, ForecastFrame)>;
}

//! Staged time-series forecasting: ingest a series, fit an engine, evaluate
//! the in-sample fit and render reports, with every stage output persisted
//! as a checksummed artifact.

pub mod analysis;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod solver;
pub mod store;
pub mod validation;

pub use config::PipelineConfig;
pub use error::{ErrorKind, PipelineError, Result};
pub use pipeline::{run_batch, Pipeline, PipelineReport};

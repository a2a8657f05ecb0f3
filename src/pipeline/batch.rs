use super::orchestrator::Pipeline;
use super::state::PipelineReport;
use crate::config::PipelineConfig;
use crate::engine::ForecastEngine;
use crate::error::{PipelineError, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::info;

/// Runs independent pipelines in parallel, one namespace per `run_id`.
///
/// Run ids and report directories must be unique across the batch; a clash is
/// rejected before anything runs. Reports come back in input order.
pub fn run_batch(configs: Vec<PipelineConfig>, engine: &dyn ForecastEngine) -> Result<Vec<PipelineReport>> {
    let mut ids = HashSet::new();
    let mut report_dirs = HashSet::new();
    for cfg in &configs {
        if !ids.insert(cfg.run_id.as_str()) {
            return Err(PipelineError::InvalidConfig(format!("duplicate run_id '{}' in batch", cfg.run_id)));
        }
        if !report_dirs.insert(&cfg.report.output_dir) {
            return Err(PipelineError::InvalidConfig(format!(
                "report directory {} is shared by more than one run",
                cfg.report.output_dir.display()
            )));
        }
    }

    info!(runs = configs.len(), "starting batch");
    let reports: Vec<PipelineReport> = configs
        .into_par_iter()
        .map(|cfg| Pipeline::new(cfg, engine).run())
        .collect();

    let failed = reports.iter().filter(|r| !r.success()).count();
    info!(runs = reports.len(), failed, "batch finished");
    Ok(reports)
}

use super::state::{PipelineReport, PipelineState, Stage, StageOutcome, StageStatus};
use crate::analysis::Evaluator;
use crate::config::PipelineConfig;
use crate::display::{Reporter, SvgReporter};
use crate::engine::{ForecastAdapter, ForecastEngine};
use crate::error::Result;
use crate::ingest::{self, SourceRef};
use crate::store::{ArtifactPayload, ArtifactStore, IngestedData, StageId};
use std::time::Instant;
use tracing::{error, info, info_span};

/// Runs Ingest -> Fit -> Evaluate -> Visualize for one configuration.
///
/// Each stage reads its inputs back from the artifact store and writes its
/// outputs only once it has fully succeeded. The first failure ends the run
/// and leaves every previously stored artifact in place.
pub struct Pipeline<'e> {
    config: PipelineConfig,
    engine: &'e dyn ForecastEngine,
    reporter: Box<dyn Reporter + 'e>,
}

impl<'e> Pipeline<'e> {
    pub fn new(config: PipelineConfig, engine: &'e dyn ForecastEngine) -> Self {
        let reporter = Box::new(SvgReporter::new(config.report.clone(), config.model.interval_width));
        Self { config, engine, reporter }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter + 'e>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> PipelineReport {
        let span = info_span!("pipeline", run_id = %self.config.run_id);
        let _enter = span.enter();
        let started = Instant::now();

        let mut stages = Vec::with_capacity(Stage::ALL.len());
        let opened = self
            .config
            .validate()
            .and_then(|_| ArtifactStore::open(&self.config.artifact_root, &self.config.run_id));
        let store = match opened {
            Ok(store) => store,
            Err(e) => {
                error!(error = %e, "pipeline setup failed");
                stages.push(StageOutcome {
                    stage: Stage::Ingest,
                    status: StageStatus::Err { kind: e.kind(), message: e.to_string() },
                    elapsed: started.elapsed(),
                });
                return PipelineReport {
                    run_id: self.config.run_id.clone(),
                    state: PipelineState::failed(Stage::Ingest, &e),
                    stages,
                    elapsed: started.elapsed(),
                };
            }
        };

        let mut state = PipelineState::Ingest;
        while let Some(stage) = state.stage() {
            let t0 = Instant::now();
            let result = self.run_stage(stage, &store);
            let elapsed = t0.elapsed();

            match result {
                Ok(()) => {
                    info!(stage = %stage, elapsed_s = elapsed.as_secs_f64(), "stage complete");
                    stages.push(StageOutcome { stage, status: StageStatus::Ok, elapsed });
                    state = PipelineState::after(stage);
                }
                Err(e) => {
                    error!(stage = %stage, kind = %e.kind(), error = %e, "stage failed");
                    stages.push(StageOutcome {
                        stage,
                        status: StageStatus::Err { kind: e.kind(), message: e.to_string() },
                        elapsed,
                    });
                    state = PipelineState::failed(stage, &e);
                }
            }
        }

        let elapsed = started.elapsed();
        if state == PipelineState::Done {
            info!(elapsed_s = elapsed.as_secs_f64(), "pipeline complete");
        }
        PipelineReport { run_id: self.config.run_id.clone(), state, stages, elapsed }
    }

    fn run_stage(&self, stage: Stage, store: &ArtifactStore) -> Result<()> {
        match stage {
            Stage::Ingest => self.ingest(store),
            Stage::Fit => self.fit(store),
            Stage::Evaluate => self.evaluate(store),
            Stage::Visualize => self.visualize(store),
        }
    }

    fn ingest(&self, store: &ArtifactStore) -> Result<()> {
        let source = SourceRef::parse(&self.config.source.location);
        let (raw, frame) = ingest::ingest(&source, &self.config.source)?;
        store.put(StageId::Ingested, &ArtifactPayload::Ingested(IngestedData { raw, frame }), None)?;
        Ok(())
    }

    fn fit(&self, store: &ArtifactStore) -> Result<()> {
        let upstream = store.read(StageId::Ingested)?.checksum;
        let data = store.get_ingested()?;

        let adapter = ForecastAdapter::new(self.engine);
        let (model, forecast) =
            adapter.fit_predict(&data.frame, self.config.horizon, self.config.frequency, &self.config.model)?;

        store.put(StageId::Model, &ArtifactPayload::Model(model), Some(&upstream))?;
        store.put(StageId::Forecast, &ArtifactPayload::Forecast(forecast), Some(&upstream))?;
        Ok(())
    }

    fn evaluate(&self, store: &ArtifactStore) -> Result<()> {
        let upstream = store.read(StageId::Forecast)?.checksum;
        let data = store.get_ingested()?;
        let forecast = store.get_forecast()?;

        let record = Evaluator::new(self.config.evaluation.mape_policy).evaluate(&data.frame, &forecast)?;
        for (name, value) in &record.metrics {
            info!(metric = %name, value = *value, "evaluation");
        }
        store.put(StageId::Evaluation, &ArtifactPayload::Evaluation(record), Some(&upstream))?;
        Ok(())
    }

    fn visualize(&self, store: &ArtifactStore) -> Result<()> {
        let upstream = store.read(StageId::Evaluation)?.checksum;
        let data = store.get_ingested()?;
        let forecast = store.get_forecast()?;
        let evaluation = store.get_evaluation()?;

        let manifest = self.reporter.render(&data.frame, &forecast, &evaluation)?;
        store.put(StageId::Report, &ArtifactPayload::Report(manifest), Some(&upstream))?;
        Ok(())
    }
}

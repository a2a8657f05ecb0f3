//! Stage orchestration.
mod batch;
mod orchestrator;
mod state;

pub use batch::run_batch;
pub use orchestrator::Pipeline;
pub use state::{PipelineReport, PipelineState, Stage, StageOutcome, StageStatus};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics;
    use crate::config::{PipelineConfig, ReportConfig, SourceConfig};
    use crate::engine::HarmonicEngine;
    use crate::error::ErrorKind;
    use crate::store::{ArtifactStore, StageId};
    use std::fmt::Write as _;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn monthly_csv(path: &Path, n: usize) {
        let mut text = String::from("Month,Passengers\n");
        for i in 0..n {
            let value = 120.0 * (1.0 + 0.01 * i as f64) * (1.0 + 0.1 * ((i % 12) as f64 / 11.0));
            writeln!(text, "{}-{:02},{:.1}", 1990 + i / 12, i % 12 + 1, value).unwrap();
        }
        fs::write(path, text).unwrap();
    }

    fn config(root: &Path, run_id: &str, rows: usize) -> PipelineConfig {
        let csv = root.join(format!("{}.csv", run_id));
        monthly_csv(&csv, rows);
        PipelineConfig {
            run_id: run_id.to_string(),
            source: SourceConfig { location: csv.display().to_string(), ..Default::default() },
            horizon: 12,
            artifact_root: root.join("artifacts"),
            report: ReportConfig { output_dir: root.join("viz").join(run_id), ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn test_full_run_writes_every_artifact() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path(), "ok", 48);
        let engine = HarmonicEngine;
        let report = Pipeline::new(cfg.clone(), &engine).run();

        assert!(report.success(), "{:?}", report.state);
        assert_eq!(report.stages.len(), 4);
        assert!(report.stages.iter().all(|s| s.is_ok()));

        let store = ArtifactStore::open(&cfg.artifact_root, "ok").unwrap();
        assert_eq!(store.list(), StageId::ALL.to_vec());
        assert_eq!(store.get_forecast().unwrap().len(), 60);

        let evaluation = store.get_evaluation().unwrap();
        assert!(evaluation.metric(metrics::MAE) >= 0.0);
        assert!(evaluation.metric(metrics::RMSE) >= 0.0);
        assert!(evaluation.metric(metrics::R2) <= 1.0);

        // lineage: forecast was derived from the ingested artifact
        let ingested = store.read(StageId::Ingested).unwrap();
        let forecast = store.read(StageId::Forecast).unwrap();
        assert_eq!(forecast.upstream_checksum.as_deref(), Some(ingested.checksum.as_str()));
        assert!(cfg.report.output_dir.join("metrics.csv").is_file());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path(), "same", 36);
        let engine = HarmonicEngine;
        let store = ArtifactStore::open(&cfg.artifact_root, "same").unwrap();

        assert!(Pipeline::new(cfg.clone(), &engine).run().success());
        let first: Vec<String> = StageId::ALL.iter().map(|s| store.read(*s).unwrap().checksum).collect();
        let first_eval = store.get_evaluation().unwrap();

        assert!(Pipeline::new(cfg, &engine).run().success());
        let second: Vec<String> = StageId::ALL.iter().map(|s| store.read(*s).unwrap().checksum).collect();
        assert_eq!(first, second);
        assert_eq!(first_eval, store.get_evaluation().unwrap());
    }

    #[test]
    fn test_failing_stage_halts_pipeline() {
        let dir = tempdir().unwrap();
        // six months cannot support yearly seasonality
        let cfg = config(dir.path(), "short", 6);
        let engine = HarmonicEngine;
        let report = Pipeline::new(cfg.clone(), &engine).run();

        assert_eq!(report.failure(), Some((Stage::Fit, ErrorKind::InsufficientHistory)));
        assert_eq!(report.stages.len(), 2);
        let store = ArtifactStore::open(&cfg.artifact_root, "short").unwrap();
        assert_eq!(store.list(), vec![StageId::Ingested]);
        assert!(!cfg.report.output_dir.exists());
    }

    #[test]
    fn test_failed_rerun_keeps_last_successful_artifacts() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path(), "kept", 24);
        let engine = HarmonicEngine;
        let store = ArtifactStore::open(&cfg.artifact_root, "kept").unwrap();
        assert!(Pipeline::new(cfg.clone(), &engine).run().success());
        let before: Vec<String> = StageId::ALL.iter().map(|s| store.read(*s).unwrap().checksum).collect();

        fs::write(&cfg.source.location, "Month,Passengers\n1990-01,1\n1990-01,2\n").unwrap();
        let report = Pipeline::new(cfg.clone(), &engine).run();
        assert_eq!(report.failure(), Some((Stage::Ingest, ErrorKind::SchemaMismatch)));

        let after: Vec<String> = StageId::ALL.iter().map(|s| store.read(*s).unwrap().checksum).collect();
        assert_eq!(before, after);
        assert_eq!(store.get_forecast().unwrap().len(), 36);
    }

    #[test]
    fn test_missing_source_fails_ingest() {
        let dir = tempdir().unwrap();
        let mut cfg = config(dir.path(), "missing", 24);
        cfg.source.location = dir.path().join("nope.csv").display().to_string();
        let report = Pipeline::new(cfg, &HarmonicEngine).run();
        assert_eq!(report.failure(), Some((Stage::Ingest, ErrorKind::SourceUnavailable)));
        assert_eq!(report.stages.len(), 1);
    }

    #[test]
    fn test_batch_runs_in_separate_namespaces() {
        let dir = tempdir().unwrap();
        let configs = vec![config(dir.path(), "a", 36), config(dir.path(), "b", 6), config(dir.path(), "c", 24)];
        let reports = run_batch(configs, &HarmonicEngine).unwrap();

        let ids: Vec<&str> = reports.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(reports[0].success());
        assert!(!reports[1].success());
        assert!(reports[2].success());
    }

    #[test]
    fn test_batch_rejects_duplicate_run_ids() {
        let dir = tempdir().unwrap();
        let mut second = config(dir.path(), "x", 24);
        second.report.output_dir = dir.path().join("other");
        let err = run_batch(vec![config(dir.path(), "x", 24), second], &HarmonicEngine).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }
}

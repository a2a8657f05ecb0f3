use super::types::*;
use crate::analysis::EvaluationRecord;
use crate::display::ReportManifest;
use crate::engine::ModelHandle;
use crate::error::{PipelineError, Result};
use crate::frame::ForecastFrame;
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Stage-keyed artifact persistence under `<root>/<namespace>/`.
///
/// Writes go to a temporary file in the target directory and are renamed into
/// place, so a reader sees either the previous artifact or the new one. The
/// store keeps no state between calls; the directory is the source of truth.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    namespace: String,
}

impl ArtifactStore {
    pub fn open(root: impl AsRef<Path>, namespace: &str) -> Result<Self> {
        let dir = root.as_ref().join(namespace);
        fs::create_dir_all(&dir)
            .map_err(|e| PipelineError::Io(format!("cannot create {}: {}", dir.display(), e)))?;
        Ok(Self { dir, namespace: namespace.to_string() })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, stage: StageId) -> PathBuf {
        self.dir.join(stage.file_name())
    }

    pub fn contains(&self, stage: StageId) -> bool {
        self.path_of(stage).is_file()
    }

    /// Stages with an artifact on disk, in pipeline order.
    pub fn list(&self) -> Vec<StageId> {
        StageId::ALL.into_iter().filter(|s| self.contains(*s)).collect()
    }

    /// Deletes the artifact for `stage`. Missing artifacts are not an error.
    pub fn remove(&self, stage: StageId) -> Result<()> {
        match fs::remove_file(self.path_of(stage)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically writes `payload` as the artifact for `stage`. Last write wins.
    pub fn put(&self, stage: StageId, payload: &ArtifactPayload, upstream_checksum: Option<&str>) -> Result<StageArtifact> {
        if payload.stage() != stage {
            return Err(PipelineError::Io(format!(
                "a {} payload cannot be stored as stage '{}'",
                payload.stage(),
                stage
            )));
        }
        let value = serde_json::to_value(payload)
            .map_err(|e| PipelineError::Io(format!("cannot serialize '{}': {}", stage, e)))?;
        let checksum = checksum_of(&value)?;

        let artifact = StageArtifact {
            stage,
            schema_version: SCHEMA_VERSION,
            checksum,
            upstream_checksum: upstream_checksum.map(str::to_string),
            created_at: Utc::now(),
            payload: value,
        };
        let bytes = serde_json::to_vec_pretty(&artifact)
            .map_err(|e| PipelineError::Io(format!("cannot serialize '{}': {}", stage, e)))?;

        let target = self.path_of(stage);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target)
            .map_err(|e| PipelineError::Io(format!("cannot persist {}: {}", target.display(), e.error)))?;

        debug!(stage = %stage, checksum = %artifact.checksum, path = %target.display(), "artifact written");
        Ok(artifact)
    }

    /// Reads and verifies the envelope for `stage` without decoding the payload.
    pub fn read(&self, stage: StageId) -> Result<StageArtifact> {
        let path = self.path_of(stage);
        let bytes = fs::read(&path)
            .map_err(|e| PipelineError::artifact_not_found(stage, format!("{}: {}", path.display(), e)))?;
        let artifact: StageArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| PipelineError::artifact_not_found(stage, format!("malformed envelope: {}", e)))?;

        if artifact.stage != stage {
            return Err(PipelineError::artifact_not_found(
                stage,
                format!("file holds stage '{}'", artifact.stage),
            ));
        }
        if artifact.schema_version != SCHEMA_VERSION {
            return Err(PipelineError::artifact_not_found(
                stage,
                format!("schema version {} (expected {})", artifact.schema_version, SCHEMA_VERSION),
            ));
        }
        let actual = checksum_of(&artifact.payload)?;
        if actual != artifact.checksum {
            return Err(PipelineError::artifact_not_found(
                stage,
                format!("checksum mismatch: recorded {}, computed {}", artifact.checksum, actual),
            ));
        }
        Ok(artifact)
    }

    pub fn get(&self, stage: StageId) -> Result<ArtifactPayload> {
        let artifact = self.read(stage)?;
        serde_json::from_value(artifact.payload)
            .map_err(|e| PipelineError::artifact_not_found(stage, format!("malformed payload: {}", e)))
    }

    pub fn get_ingested(&self) -> Result<IngestedData> {
        match self.get(StageId::Ingested)? {
            ArtifactPayload::Ingested(data) => Ok(data),
            other => Err(wrong_kind(StageId::Ingested, &other)),
        }
    }

    pub fn get_model(&self) -> Result<ModelHandle> {
        match self.get(StageId::Model)? {
            ArtifactPayload::Model(model) => Ok(model),
            other => Err(wrong_kind(StageId::Model, &other)),
        }
    }

    pub fn get_forecast(&self) -> Result<ForecastFrame> {
        match self.get(StageId::Forecast)? {
            ArtifactPayload::Forecast(forecast) => Ok(forecast),
            other => Err(wrong_kind(StageId::Forecast, &other)),
        }
    }

    pub fn get_evaluation(&self) -> Result<EvaluationRecord> {
        match self.get(StageId::Evaluation)? {
            ArtifactPayload::Evaluation(record) => Ok(record),
            other => Err(wrong_kind(StageId::Evaluation, &other)),
        }
    }

    pub fn get_report(&self) -> Result<ReportManifest> {
        match self.get(StageId::Report)? {
            ArtifactPayload::Report(manifest) => Ok(manifest),
            other => Err(wrong_kind(StageId::Report, &other)),
        }
    }
}

fn checksum_of(value: &serde_json::Value) -> Result<String> {
    let canonical = serde_json::to_vec(value).map_err(|e| PipelineError::Io(e.to_string()))?;
    Ok(checksum_hex(&canonical))
}

fn wrong_kind(stage: StageId, payload: &ArtifactPayload) -> PipelineError {
    PipelineError::artifact_not_found(stage, format!("file holds a {} payload", payload.stage()))
}

use crate::analysis::EvaluationRecord;
use crate::display::ReportManifest;
use crate::engine::ModelHandle;
use crate::frame::{ForecastFrame, TimeSeriesFrame};
use crate::ingest::RawTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bumped whenever the envelope or a payload changes shape.
pub const SCHEMA_VERSION: u32 = 1;

/// Key of one artifact inside a run namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Ingested,
    Model,
    Forecast,
    Evaluation,
    Report,
}

impl StageId {
    pub const ALL: [StageId; 5] =
        [StageId::Ingested, StageId::Model, StageId::Forecast, StageId::Evaluation, StageId::Report];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Ingested => "ingested",
            StageId::Model => "model",
            StageId::Forecast => "forecast",
            StageId::Evaluation => "evaluation",
            StageId::Report => "report",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Output of the ingest stage: the table as read and the frame built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedData {
    pub raw: RawTable,
    pub frame: TimeSeriesFrame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ArtifactPayload {
    Ingested(IngestedData),
    Model(ModelHandle),
    Forecast(ForecastFrame),
    Evaluation(EvaluationRecord),
    Report(ReportManifest),
}

impl ArtifactPayload {
    /// The stage this payload belongs under.
    pub fn stage(&self) -> StageId {
        match self {
            ArtifactPayload::Ingested(_) => StageId::Ingested,
            ArtifactPayload::Model(_) => StageId::Model,
            ArtifactPayload::Forecast(_) => StageId::Forecast,
            ArtifactPayload::Evaluation(_) => StageId::Evaluation,
            ArtifactPayload::Report(_) => StageId::Report,
        }
    }
}

/// The on-disk envelope around a payload.
///
/// `payload` is kept as a JSON value so the checksum can be verified before
/// the payload is decoded into its typed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageArtifact {
    pub stage: StageId,
    pub schema_version: u32,
    /// FNV-1a 64 of the canonical payload JSON, lowercase hex.
    pub checksum: String,
    /// Checksum of the artifact this stage consumed.
    pub upstream_checksum: Option<String>,
    pub created_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// 64-bit FNV-1a, used for artifact checksums.
#[derive(Copy, Clone, Debug)]
pub struct Fnv1a(u64);

impl Fnv1a {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    pub fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 ^ (*b as u64)).wrapping_mul(Self::PRIME);
        }
    }

    pub fn finish_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

pub fn checksum_hex(bytes: &[u8]) -> String {
    let mut h = Fnv1a::new();
    h.update(bytes);
    h.finish_hex()
}

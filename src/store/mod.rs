//! Persistence of stage outputs.
mod registry;
mod types;

pub use registry::ArtifactStore;
pub use types::{checksum_hex, ArtifactPayload, Fnv1a, IngestedData, StageArtifact, StageId, SCHEMA_VERSION};

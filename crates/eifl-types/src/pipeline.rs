use serde::{Deserialize, Serialize};

use crate::ids::{PipelineId, RepoId};
use crate::manifest::Manifest;
use crate::timestamp::UtcTimestamp;

/// `(repo_id, name)` is unique. `config` is the raw manifest JSON kept
/// around for forward compatibility — parsed on read rather than eagerly,
/// so a manifest shape change doesn't break rows written by an older
/// server version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub repo_id: RepoId,
    pub name: String,
    pub config: serde_json::Value,
    pub next_run_at: Option<UtcTimestamp>,
    pub created_at: UtcTimestamp,
}

impl Pipeline {
    pub fn new(repo_id: RepoId, name: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            id: PipelineId::new(),
            repo_id,
            name: name.into(),
            config,
            next_run_at: None,
            created_at: UtcTimestamp::now(),
        }
    }

    /// Parse the stored manifest JSON, failing with a structured
    /// `EiflError::Validation` identifying the offending field.
    pub fn manifest(&self) -> crate::error::Result<Manifest> {
        Manifest::parse(&self.config)
    }
}

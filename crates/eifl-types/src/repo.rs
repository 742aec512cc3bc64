use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, RepoId};
use crate::timestamp::UtcTimestamp;

/// Either hosts a local bare repo at `path` or references a remote
/// (`remote_url`). `(project_id, name)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repo {
    pub id: RepoId,
    pub project_id: ProjectId,
    pub name: String,
    pub path: String,
    pub remote_url: Option<String>,
    pub default_branch: String,
    pub created_at: UtcTimestamp,
}

impl Repo {
    pub fn new(project_id: ProjectId, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: RepoId::new(),
            project_id,
            name: name.into(),
            path: path.into(),
            remote_url: None,
            default_branch: "main".to_string(),
            created_at: UtcTimestamp::now(),
        }
    }

    /// Relative local path used by the dispatcher when no `remote_url` is
    /// configured (spec §4.H step 6: `/git/<repo.path>`).
    pub fn local_job_url(&self) -> String {
        format!("/git/{}", self.path)
    }
}

use serde::{Deserialize, Serialize};

use crate::ids::ProjectId;
use crate::timestamp::UtcTimestamp;

/// A container for repos. Deleting a project cascades to its repos,
/// pipelines, runs, and steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: UtcTimestamp,
}

impl Project {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: ProjectId::new(),
            name: name.into(),
            description,
            created_at: UtcTimestamp::now(),
        }
    }
}

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::RunnerId;
use crate::timestamp::UtcTimestamp;

/// Spec §9 Open Question: `busy` means "at capacity right now"; the status
/// can regress to `online` as soon as any single job completes, regardless
/// of remaining in-flight jobs. Not a stable flag — callers should not
/// assume it monotonically tracks load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerStatus {
    Online,
    Offline,
    Busy,
}

impl fmt::Display for RunnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Busy => "busy",
        };
        write!(f, "{s}")
    }
}

/// An external worker process authenticated by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    pub id: RunnerId,
    pub name: String,
    pub token: String,
    pub status: RunnerStatus,
    pub tags: BTreeSet<String>,
    pub max_concurrency: u32,
    pub active_jobs: u32,
    pub last_seen: Option<UtcTimestamp>,
    pub created_at: UtcTimestamp,
}

impl Runner {
    pub fn new(name: impl Into<String>, token: impl Into<String>, max_concurrency: u32) -> Self {
        Self {
            id: RunnerId::new(),
            name: name.into(),
            token: token.into(),
            status: RunnerStatus::Offline,
            tags: BTreeSet::new(),
            max_concurrency: max_concurrency.max(1),
            active_jobs: 0,
            last_seen: None,
            created_at: UtcTimestamp::now(),
        }
    }

    pub fn is_at_capacity(&self) -> bool {
        self.active_jobs >= self.max_concurrency
    }

    /// Spec §4.H step 4: the runner is eligible iff the manifest's required
    /// tags are a subset of the runner's tags. An empty required set
    /// matches any runner.
    pub fn satisfies_tags(&self, required: &[String]) -> bool {
        required.iter().all(|tag| self.tags.contains(tag))
    }
}

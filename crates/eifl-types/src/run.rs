use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::{PipelineId, RunId};
use crate::timestamp::UtcTimestamp;

/// Run state machine (spec §4.G):
///
/// ```text
/// pending ─(dispatched)→ running ─(complete)→ success | failed
///    │                        │
///    └──(cancel)──────────────┴─(cancel)→ cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// `finished_at` is set iff the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("invalid run status: {other}")),
        }
    }
}

/// The source that created a [`Run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggeredBy {
    Push,
    Schedule,
    Manual,
    GithubPush,
}

impl TriggeredBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Schedule => "schedule",
            Self::Manual => "manual",
            Self::GithubPush => "github-push",
        }
    }
}

impl fmt::Display for TriggeredBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One execution attempt of a pipeline against a specific commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub pipeline_id: PipelineId,
    pub status: RunStatus,
    pub commit_sha: Option<String>,
    pub branch: Option<String>,
    pub triggered_by: TriggeredBy,
    pub started_at: Option<UtcTimestamp>,
    pub finished_at: Option<UtcTimestamp>,
    pub created_at: UtcTimestamp,
}

impl Run {
    pub fn new(
        pipeline_id: PipelineId,
        triggered_by: TriggeredBy,
        commit_sha: Option<String>,
        branch: Option<String>,
    ) -> Self {
        Self {
            id: RunId::new(),
            pipeline_id,
            status: RunStatus::Pending,
            commit_sha,
            branch,
            triggered_by,
            started_at: None,
            finished_at: None,
            created_at: UtcTimestamp::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_pending_or_running(&self) -> bool {
        matches!(self.status, RunStatus::Pending | RunStatus::Running)
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::{RunId, StepId};
use crate::timestamp::UtcTimestamp;

/// Step state machine mirrors [`crate::RunStatus`] but adds `skipped`,
/// produced when a manifest `if` condition evaluates to false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            other => Err(format!("invalid step status: {other}")),
        }
    }
}

/// One shell command within a run. Ordering within a run is the insertion
/// order (stable ascending `seq`); `output` accumulates via append-only
/// concatenation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub run_id: RunId,
    /// Insertion-order sequence number, used to keep step ordering stable
    /// regardless of the id's own ordering (ids are random UUIDs).
    pub seq: u32,
    pub name: String,
    pub command: String,
    pub status: StepStatus,
    pub exit_code: Option<i32>,
    pub output: String,
    pub started_at: Option<UtcTimestamp>,
    pub finished_at: Option<UtcTimestamp>,
}

impl Step {
    pub fn new(run_id: RunId, seq: u32, name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: StepId::new(),
            run_id,
            seq,
            name: name.into(),
            command: command.into(),
            status: StepStatus::Pending,
            exit_code: None,
            output: String::new(),
            started_at: None,
            finished_at: None,
        }
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineComparison;
use crate::run::Run;
use crate::step::{Step, StepStatus};

/// A single step as seen by a runner: identity and command, not the full
/// mutable row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStep {
    pub id: crate::ids::StepId,
    pub name: String,
    pub command: String,
    pub status: StepStatus,
}

impl From<&Step> for JobStep {
    fn from(step: &Step) -> Self {
        Self {
            id: step.id,
            name: step.name.clone(),
            command: step.command.clone(),
            status: step.status,
        }
    }
}

/// The payload a dispatched job carries to the runner (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPayload {
    pub run: Run,
    pub steps: Vec<JobStep>,
    pub repo_url: String,
    pub commit_sha: Option<String>,
    pub branch: Option<String>,
    pub pipeline_config: serde_json::Value,
    pub secrets: BTreeMap<String, String>,
}

/// One `{oldrev, newrev, refname}` record from a `git receive-pack`
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivePackRecord {
    pub oldrev: String,
    pub newrev: String,
    pub refname: String,
}

/// The all-zero SHA used by Git to mean "ref did not exist before/after".
pub const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

impl ReceivePackRecord {
    pub fn is_delete(&self) -> bool {
        self.newrev == ZERO_SHA
    }

    /// `refs/heads/<branch>` → `Some(branch)`, anything else → `None`.
    pub fn branch_name(&self) -> Option<&str> {
        self.refname.strip_prefix("refs/heads/")
    }
}

/// One `{key, value, unit?}` entry in `runComplete`'s `metrics[]` body
/// (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedMetric {
    pub key: String,
    pub value: f64,
    pub unit: Option<String>,
}

/// Returned by `runComplete` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegressionSummary {
    pub checked: usize,
    pub regressions: usize,
    pub has_regressions: bool,
    pub details: Vec<BaselineComparison>,
}

impl RegressionSummary {
    pub fn from_comparisons(comparisons: Vec<BaselineComparison>) -> Self {
        let regressions = comparisons.iter().filter(|c| !c.within_tolerance).count();
        Self {
            checked: comparisons.len(),
            regressions,
            has_regressions: regressions > 0,
            details: comparisons,
        }
    }
}

//! The in-repo pipeline manifest (`.eifl.json`): shape, validation, and the
//! two boolean helpers used by the push trigger and the lifecycle engine.
//!
//! Kept as a hand-rolled `serde_json::Value` pre-pass plus typed
//! deserialization (rather than relying on typed-deserialize error messages
//! alone) so a malformed manifest reports the specific offending field, per
//! spec §4.C.

use serde::{Deserialize, Serialize};

use crate::error::{EiflError, Result};

/// A single cron entry under `triggers.schedule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub cron: String,
}

/// `triggers.push` settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushTrigger {
    #[serde(default)]
    pub branches: Option<Vec<String>>,
}

/// The `triggers` section; every sub-section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Triggers {
    #[serde(default)]
    pub push: Option<PushTrigger>,
    #[serde(default)]
    pub manual: Option<bool>,
    #[serde(default)]
    pub schedule: Option<Vec<ScheduleEntry>>,
}

/// A single pipeline step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStep {
    pub name: String,
    pub run: String,
    #[serde(default)]
    pub capture_sizes: Option<Vec<String>>,
    #[serde(default)]
    pub r#if: Option<String>,
}

/// The parsed `.eifl.json` pipeline manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub triggers: Option<Triggers>,
    #[serde(default)]
    pub runner_tags: Option<Vec<String>>,
    pub steps: Vec<ManifestStep>,
}

impl Manifest {
    /// Parse and validate a manifest from raw JSON, raising a structured
    /// `EiflError::Validation` that names the offending field.
    pub fn parse(value: &serde_json::Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| EiflError::validation("$", "manifest must be a JSON object"))?;

        match obj.get("name") {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {}
            Some(serde_json::Value::String(_)) => {
                return Err(EiflError::validation("name", "must not be empty"));
            }
            _ => return Err(EiflError::validation("name", "missing or not a string")),
        }

        match obj.get("steps") {
            Some(serde_json::Value::Array(steps)) if !steps.is_empty() => {}
            Some(serde_json::Value::Array(_)) => {
                return Err(EiflError::validation("steps", "must contain at least one step"));
            }
            _ => return Err(EiflError::validation("steps", "missing or not an array")),
        }

        let manifest: Manifest = serde_json::from_value(value.clone())
            .map_err(|e| EiflError::validation("$", format!("malformed manifest: {e}")))?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Supplemental: enforce invariants the wire shape alone doesn't
    /// guarantee, but that later components (runner addressing by step
    /// name, CLI plan printing) rely on.
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(EiflError::validation("name", "must not be empty"));
        }
        if self.steps.is_empty() {
            return Err(EiflError::validation("steps", "must contain at least one step"));
        }
        for step in &self.steps {
            if step.name.trim().is_empty() {
                return Err(EiflError::validation("steps[].name", "must not be empty"));
            }
            if step.run.trim().is_empty() {
                return Err(EiflError::validation("steps[].run", "must not be empty"));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(EiflError::validation(
                    "steps[].name",
                    format!("duplicate step name `{}`", step.name),
                ));
            }
        }
        Ok(())
    }

    pub fn runner_tags(&self) -> &[String] {
        self.runner_tags.as_deref().unwrap_or(&[])
    }

    pub fn schedule_entries(&self) -> &[ScheduleEntry] {
        self.triggers
            .as_ref()
            .and_then(|t| t.schedule.as_deref())
            .unwrap_or(&[])
    }
}

/// Spec §4.C: true if `triggers` absent; false if `triggers.push` absent;
/// true if `branches` absent/empty; otherwise true iff any pattern matches.
pub fn should_trigger_on_push(manifest: &Manifest, branch: &str) -> bool {
    let Some(triggers) = &manifest.triggers else {
        return true;
    };
    let Some(push) = &triggers.push else {
        return false;
    };
    match &push.branches {
        None => true,
        Some(branches) if branches.is_empty() => true,
        Some(branches) => branches.iter().any(|pattern| branch_matches(pattern, branch)),
    }
}

/// Pattern syntax: `*` (all), `prefix*`, `*suffix`, or literal equality.
pub fn branch_matches(pattern: &str, branch: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return branch.starts_with(prefix);
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return branch.ends_with(suffix);
    }
    pattern == branch
}

/// Evaluation context available to step `if` conditions.
#[derive(Debug, Clone, Copy)]
pub struct StepConditionContext<'a> {
    pub trigger: &'a str,
    pub branch: Option<&'a str>,
}

/// Recognizes exactly `var == 'literal'` and `var != 'literal'` with
/// optional whitespace. Unparseable conditions evaluate to **false** and
/// the step is marked `skipped` — this is documented as stable behavior
/// (spec §9), not a bug to be fixed later.
pub fn evaluate_step_condition(condition: &str, ctx: StepConditionContext<'_>) -> bool {
    let Some((var, op, literal)) = parse_condition(condition) else {
        return false;
    };

    let value = match var {
        "trigger" => Some(ctx.trigger),
        "branch" => ctx.branch,
        _ => return false,
    };

    let Some(value) = value else {
        return false;
    };

    match op {
        ConditionOp::Eq => value == literal,
        ConditionOp::Ne => value != literal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConditionOp {
    Eq,
    Ne,
}

/// Hand-written micro-parser for `var (==|!=) 'literal'`. Deliberately
/// minimal per spec §9's design note — no parser-combinator crate.
fn parse_condition(condition: &str) -> Option<(&str, ConditionOp, &str)> {
    let condition = condition.trim();
    let (op_str, op) = if let Some(idx) = condition.find("==") {
        (&condition[idx..idx + 2], ConditionOp::Eq)
    } else if let Some(idx) = condition.find("!=") {
        (&condition[idx..idx + 2], ConditionOp::Ne)
    } else {
        return None;
    };

    let op_idx = condition.find(op_str)?;
    let var = condition[..op_idx].trim();
    let rest = condition[op_idx + op_str.len()..].trim();

    if var.is_empty() || !var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    let literal = strip_quotes(rest)?;
    Some((var, op, literal))
}

fn strip_quotes(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.len() < 2 {
        return None;
    }
    let bytes = s.as_bytes();
    let quote = bytes[0];
    if (quote == b'\'' || quote == b'"') && bytes[s.len() - 1] == quote {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

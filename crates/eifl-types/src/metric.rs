use serde::{Deserialize, Serialize};

use crate::ids::{MetricId, RunId};
use crate::timestamp::UtcTimestamp;

/// A numeric measurement captured from a run. `(run_id, key)` is not
/// unique — history is kept per-key over all runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub id: MetricId,
    pub run_id: RunId,
    pub key: String,
    pub value: f64,
    pub unit: Option<String>,
    pub created_at: UtcTimestamp,
}

impl Metric {
    pub fn new(run_id: RunId, key: impl Into<String>, value: f64, unit: Option<String>) -> Self {
        Self {
            id: MetricId::new(),
            run_id,
            key: key.into(),
            value,
            unit,
            created_at: UtcTimestamp::now(),
        }
    }
}

/// Lines matching `::metric::<key>=<numeric>[:<unit>]` in step stdout,
/// parsed by the runner and reported via `runComplete` (spec §6).
pub fn parse_metric_line(line: &str) -> Option<(String, f64, Option<String>)> {
    let rest = line.trim().strip_prefix("::metric::")?;
    let (key, value_part) = rest.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let (value_str, unit) = match value_part.split_once(':') {
        Some((v, u)) => (v, Some(u.to_string())),
        None => (value_part, None),
    };
    let value: f64 = value_str.trim().parse().ok()?;
    Some((key.to_string(), value, unit))
}

/// Captured file sizes are reported with key `size.<sanitized-path>`, unit
/// `bytes`. Sanitizes by replacing path separators and glob characters with
/// `_` so the key is stable and comparable across runs.
pub fn size_metric_key(path: &str) -> String {
    let sanitized: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("size.{sanitized}")
}

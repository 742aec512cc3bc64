use serde::{Deserialize, Serialize};

use crate::ids::{BaselineId, PipelineId};
use crate::timestamp::UtcTimestamp;

/// A per-pipeline, per-metric reference value and tolerance used to flag
/// regressions. `(pipeline_id, key)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub id: BaselineId,
    pub pipeline_id: PipelineId,
    pub key: String,
    pub baseline_value: f64,
    pub tolerance_pct: f64,
    pub updated_at: UtcTimestamp,
}

pub const DEFAULT_TOLERANCE_PCT: f64 = 10.0;

impl Baseline {
    pub fn new(pipeline_id: PipelineId, key: impl Into<String>, baseline_value: f64) -> Self {
        Self {
            id: BaselineId::new(),
            pipeline_id,
            key: key.into(),
            baseline_value,
            tolerance_pct: DEFAULT_TOLERANCE_PCT,
            updated_at: UtcTimestamp::now(),
        }
    }
}

/// One comparison between a recorded metric and its pipeline baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaselineComparison {
    pub key: String,
    pub baseline_value: f64,
    pub current_value: f64,
    pub tolerance_pct: f64,
    pub deviation_pct: f64,
    pub within_tolerance: bool,
}

/// Spec §4.G:
///
/// ```text
/// deviation% = 0    if baseline == 0 and current == 0
///            = 100   if baseline == 0 and current != 0
///            = |current - baseline| / |baseline| * 100   otherwise
/// ```
pub fn deviation_pct(baseline_value: f64, current_value: f64) -> f64 {
    if baseline_value == 0.0 && current_value == 0.0 {
        0.0
    } else if baseline_value == 0.0 {
        100.0
    } else {
        ((current_value - baseline_value).abs() / baseline_value.abs()) * 100.0
    }
}

pub fn compare(baseline: &Baseline, current_value: f64) -> BaselineComparison {
    let deviation_pct = deviation_pct(baseline.baseline_value, current_value);
    BaselineComparison {
        key: baseline.key.clone(),
        baseline_value: baseline.baseline_value,
        current_value,
        tolerance_pct: baseline.tolerance_pct,
        deviation_pct,
        within_tolerance: deviation_pct <= baseline.tolerance_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deviation_is_zero_when_both_zero() {
        assert_eq!(deviation_pct(0.0, 0.0), 0.0);
    }

    #[test]
    fn deviation_is_100_when_baseline_zero_and_current_nonzero() {
        assert_eq!(deviation_pct(0.0, 5.0), 100.0);
    }

    #[test]
    fn deviation_is_relative_percentage_otherwise() {
        assert_eq!(deviation_pct(1000.0, 1200.0), 20.0);
        assert_eq!(deviation_pct(1000.0, 800.0), 20.0);
    }

    #[test]
    fn compare_flags_regression_outside_tolerance() {
        let baseline = Baseline::new(PipelineId::new(), "total_duration_ms", 1000.0);
        let result = compare(&baseline, 1200.0);
        assert_eq!(result.deviation_pct, 20.0);
        assert!(!result.within_tolerance);
    }

    #[test]
    fn compare_passes_within_tolerance() {
        let baseline = Baseline::new(PipelineId::new(), "total_duration_ms", 1000.0);
        let result = compare(&baseline, 1050.0);
        assert_eq!(result.deviation_pct, 5.0);
        assert!(result.within_tolerance);
    }
}

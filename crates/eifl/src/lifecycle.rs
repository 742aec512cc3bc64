//! Run/Step state machines, metric ingestion, and baseline comparison
//! (spec §4.G). Every non-creation transition here is driven by a runner
//! callback (see [`crate::runner`]) or a manual cancel; creation itself
//! lives in [`crate::scheduler`] and [`crate::trigger`].

use eifl_store::Store;
use eifl_types::{
    Baseline, BaselineComparison, EiflError, PipelineId, Result, Run, RunId, RunStatus, Step,
    StepId, StepStatus, UtcTimestamp, baseline,
};

/// Cancel a run from `pending` or `running`; any other status is a
/// precondition failure (spec §4.G: "Cancellation is only accepted from
/// `pending` or `running`").
pub fn cancel_run(store: &dyn Store, run_id: RunId) -> Result<Run> {
    let mut run = store.get_run(run_id)?;
    if !matches!(run.status, RunStatus::Pending | RunStatus::Running) {
        return Err(EiflError::PreconditionFailed(format!(
            "run `{run_id}` is `{}`, not pending or running",
            run.status
        )));
    }
    run.status = RunStatus::Cancelled;
    run.finished_at = Some(UtcTimestamp::now());
    store.update_run(run)
}

/// Transition a Step, per spec §4.I `stepUpdate`: sets status, appends
/// `output` if present, stamps `started_at`/`finished_at` on the
/// matching transitions.
pub fn update_step(
    store: &dyn Store,
    step_id: StepId,
    status: StepStatus,
    exit_code: Option<i32>,
    output: Option<&str>,
) -> Result<Step> {
    let mut step = store.get_step(step_id)?;
    let was_running = matches!(step.status, StepStatus::Running);
    step.status = status;
    if exit_code.is_some() {
        step.exit_code = exit_code;
    }
    if let Some(text) = output {
        step.output.push_str(text);
    }
    if status == StepStatus::Running && !was_running {
        step.started_at = Some(UtcTimestamp::now());
    }
    if status.is_terminal() {
        step.finished_at = Some(UtcTimestamp::now());
    }
    store.update_step(step)
}

/// Append-only output append (spec §4.I `stepOutput`). The runner is
/// expected to serialize its own writes per step; concurrent calls for
/// different steps are independent.
pub fn append_step_output(store: &dyn Store, step_id: StepId, output: &str) -> Result<Step> {
    let mut step = store.get_step(step_id)?;
    step.output.push_str(output);
    store.update_step(step)
}

/// Ingest one reported metric unconditionally (spec §4.G: "appends
/// unconditionally; no uniqueness across runs").
pub fn record_metric(
    store: &dyn Store,
    run_id: RunId,
    key: &str,
    value: f64,
    unit: Option<String>,
) -> Result<()> {
    store.create_metric(eifl_types::Metric::new(run_id, key, value, unit))?;
    Ok(())
}

/// Compare every metric recorded against this run to the pipeline's
/// baseline at the same key, per spec §4.G's deviation formula. Metrics
/// with no matching baseline are silently excluded, matching the spec's
/// `dom(B) ∩ dom(M)` intersection.
pub fn compare_against_baselines(store: &dyn Store, pipeline_id: PipelineId, run_id: RunId) -> Result<Vec<BaselineComparison>> {
    let metrics = store.list_metrics(run_id)?;
    let baselines = store.list_baselines(pipeline_id)?;

    let mut comparisons = Vec::new();
    for metric in &metrics {
        if let Some(matching) = baselines.iter().find(|b: &&Baseline| b.key == metric.key) {
            comparisons.push(baseline::compare(matching, metric.value));
        }
    }
    Ok(comparisons)
}

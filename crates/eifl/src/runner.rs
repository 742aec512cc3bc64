//! Authenticated runner callbacks (spec §4.I): `heartbeat`, `stepUpdate`,
//! `stepOutput`, and `runComplete`. Each function operates on behalf of
//! the caller's already-authenticated `runner_id` — the bearer-token
//! lookup itself is the out-of-scope HTTP façade's job, not this crate's.

use eifl_store::Store;
use eifl_types::{
    RegressionSummary, ReportedMetric, Result, Run, RunId, RunStatus, RunnerId, RunnerStatus, StepId, StepStatus, UtcTimestamp,
};

use crate::lifecycle;

/// Refresh `last_seen` and mark the runner `online` (spec §4.I: a
/// heartbeat never changes `active_jobs`). `busy` is not a stable flag
/// (spec §9) — a heartbeat always clears it, even for a runner currently
/// at capacity.
pub fn heartbeat(store: &dyn Store, runner_id: RunnerId) -> Result<()> {
    let mut runner = store.get_runner(runner_id)?;
    runner.last_seen = Some(UtcTimestamp::now());
    runner.status = RunnerStatus::Online;
    store.update_runner(runner)?;
    Ok(())
}

/// Spec §4.I `stepUpdate`: transition a step and touch the caller's
/// heartbeat so a chatty runner never looks stale mid-job.
pub fn step_update(
    store: &dyn Store,
    runner_id: RunnerId,
    step_id: StepId,
    status: StepStatus,
    exit_code: Option<i32>,
    output: Option<&str>,
) -> Result<()> {
    lifecycle::update_step(store, step_id, status, exit_code, output)?;
    touch_heartbeat(store, runner_id)
}

/// Spec §4.I `stepOutput`: append-only log chunk, heartbeat touched the
/// same way as `stepUpdate`.
pub fn step_output(store: &dyn Store, runner_id: RunnerId, step_id: StepId, output: &str) -> Result<()> {
    lifecycle::append_step_output(store, step_id, output)?;
    touch_heartbeat(store, runner_id)
}

/// Spec §4.I `runComplete`: the run reaches a terminal state, each
/// reported metric is recorded, the recorded metrics are compared against
/// the pipeline's baselines, and the calling runner's `active_jobs` is
/// decremented. Per the preserved Open Question (spec §9 /
/// [`eifl_types::RunnerStatus`]), the runner always returns to `online`
/// here regardless of how many jobs it still has in flight.
///
/// Spec §5: a run cancelled while a runner is still working on it stays
/// cancelled — a late callback is accepted (metrics recorded, the runner
/// still released) but must not revive the run by overwriting its status.
pub fn run_complete(
    store: &dyn Store,
    runner_id: RunnerId,
    run_id: RunId,
    status: RunStatus,
    metrics: &[ReportedMetric],
) -> Result<RegressionSummary> {
    let mut run = store.get_run(run_id)?;
    let run = if run.is_terminal() {
        run
    } else {
        run.status = status;
        run.finished_at = Some(UtcTimestamp::now());
        store.update_run(run)?
    };

    for metric in metrics {
        lifecycle::record_metric(store, run.id, &metric.key, metric.value, metric.unit.clone())?;
    }

    let comparisons = lifecycle::compare_against_baselines(store, run.pipeline_id, run.id)?;
    let summary = RegressionSummary::from_comparisons(comparisons);

    store.decrement_active_jobs(runner_id)?;
    let mut runner = store.get_runner(runner_id)?;
    runner.status = RunnerStatus::Online;
    runner.last_seen = Some(UtcTimestamp::now());
    store.update_runner(runner)?;

    Ok(summary)
}

fn touch_heartbeat(store: &dyn Store, runner_id: RunnerId) -> Result<()> {
    let mut runner = store.get_runner(runner_id)?;
    runner.last_seen = Some(UtcTimestamp::now());
    store.update_runner(runner)?;
    Ok(())
}

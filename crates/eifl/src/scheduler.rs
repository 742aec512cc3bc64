//! Cooperative scheduler tick (spec §4.E). Meant to be driven by an
//! internal timer at [`crate::config::DEFAULT_TICK_PERIOD`] and once at
//! startup — the timer loop itself belongs to the out-of-scope process
//! entry point; this module only implements one tick.

use chrono::Utc;
use eifl_store::Store;
use eifl_types::manifest::StepConditionContext;
use eifl_types::{Pipeline, Repo, Run, TriggeredBy, UtcTimestamp};

use crate::adapters::GitAdapter;
use crate::cron;
use crate::trigger::create_steps_for_run;

/// Run one scheduler tick. Per-pipeline failures are logged and do not
/// abort the tick (spec §4.E: "Failures inside a single pipeline never
/// abort the tick").
pub fn tick(store: &dyn Store, git: &dyn GitAdapter) {
    let now = Utc::now();
    let due = match store.pipelines_due(now) {
        Ok(pipelines) => pipelines,
        Err(err) => {
            tracing::warn!(error = %err, "failed to fetch due pipelines");
            return;
        }
    };

    for pipeline in due {
        if let Err(err) = tick_one(store, git, &pipeline, now) {
            tracing::warn!(pipeline_id = %pipeline.id, error = %err, "scheduler tick failed for pipeline");
        }
    }
}

fn tick_one(store: &dyn Store, git: &dyn GitAdapter, pipeline: &Pipeline, now: chrono::DateTime<Utc>) -> eifl_types::Result<()> {
    let manifest = pipeline.manifest()?;

    // Step 3: advance `next_run_at` across every schedule entry *before*
    // any Run is inserted, mandatory per spec §4.E to avoid duplicate
    // enqueueing on a slow or overlapping tick.
    let new_next_run_at = earliest_next_fire(manifest.schedule_entries(), now);
    let mut updated_pipeline = pipeline.clone();
    updated_pipeline.next_run_at = new_next_run_at.map(UtcTimestamp::from);
    store.update_pipeline(updated_pipeline)?;

    let repo = store.get_repo(pipeline.repo_id)?;
    let commit_sha = match git.resolve_head(&repo.path, &repo.default_branch) {
        Some(sha) => sha,
        None => {
            tracing::warn!(pipeline_id = %pipeline.id, "no HEAD commit resolved for default branch, skipping");
            return Ok(());
        }
    };

    if store.has_pending_or_running_run(pipeline.id)? {
        return Ok(());
    }

    let run = store.create_run(Run::new(
        pipeline.id,
        TriggeredBy::Schedule,
        Some(commit_sha),
        Some(repo.default_branch.clone()),
    ))?;

    let ctx = StepConditionContext {
        trigger: run.triggered_by.as_str(),
        branch: Some(repo.default_branch.as_str()),
    };
    create_steps_for_run(store, run.id, &manifest, ctx)?;

    Ok(())
}

fn earliest_next_fire(entries: &[eifl_types::manifest::ScheduleEntry], now: chrono::DateTime<Utc>) -> Option<chrono::DateTime<Utc>> {
    entries
        .iter()
        .filter_map(|entry| match cron::next_after(&entry.cron, now) {
            Ok(next) => Some(next),
            Err(err) => {
                tracing::warn!(cron = %entry.cron, error = %err, "invalid cron expression, skipping entry");
                None
            }
        })
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::testing::FakeGitAdapter;
    use eifl_store::InMemoryStore;
    use eifl_types::{Project, RunStatus};

    fn setup(git: &FakeGitAdapter, store: &InMemoryStore, schedule_cron: &str) -> Pipeline {
        let project = store.create_project(Project::new("demo", None)).unwrap();
        let repo = store.create_repo(Repo::new(project.id, "r", "r.git")).unwrap();
        git.set_head("r.git", "main", "abc123");

        let config = serde_json::json!({
            "name": "ci",
            "triggers": { "schedule": [{"cron": schedule_cron}] },
            "steps": [{"name": "build", "run": "echo hi"}],
        });
        let mut pipeline = Pipeline::new(repo.id, "ci", config);
        pipeline.next_run_at = Some(UtcTimestamp::from(Utc::now() - chrono::Duration::minutes(10)));
        store.create_pipeline(pipeline).unwrap()
    }

    #[test]
    fn scheduled_run_fires_exactly_once_across_two_immediate_ticks() {
        let store = InMemoryStore::new();
        let git = FakeGitAdapter::new();
        let pipeline = setup(&git, &store, "* * * * *");

        tick(&store, &git);
        tick(&store, &git);

        let runs = store.list_runs(pipeline.id).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].triggered_by, TriggeredBy::Schedule);

        let refetched = store.get_pipeline(pipeline.id).unwrap();
        assert!(refetched.next_run_at.unwrap().inner() > Utc::now());
    }

    #[test]
    fn tick_inserts_one_step_per_manifest_step_in_order() {
        let store = InMemoryStore::new();
        let git = FakeGitAdapter::new();
        let project = store.create_project(Project::new("demo", None)).unwrap();
        let repo = store.create_repo(Repo::new(project.id, "r", "r.git")).unwrap();
        git.set_head("r.git", "main", "abc123");
        let config = serde_json::json!({
            "name": "ci",
            "triggers": { "schedule": [{"cron": "* * * * *"}] },
            "steps": [{"name": "a", "run": "echo a"}, {"name": "b", "run": "echo b"}],
        });
        let mut pipeline = Pipeline::new(repo.id, "ci", config);
        pipeline.next_run_at = Some(UtcTimestamp::now());
        let pipeline = store.create_pipeline(pipeline).unwrap();

        tick(&store, &git);

        let runs = store.list_runs(pipeline.id).unwrap();
        let steps = store.list_steps(runs[0].id).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].name, "a");
        assert_eq!(steps[1].name, "b");
    }

    #[test]
    fn tick_marks_push_only_step_skipped_on_a_scheduled_run() {
        let store = InMemoryStore::new();
        let git = FakeGitAdapter::new();
        let project = store.create_project(Project::new("demo", None)).unwrap();
        let repo = store.create_repo(Repo::new(project.id, "r", "r.git")).unwrap();
        git.set_head("r.git", "main", "abc123");
        let config = serde_json::json!({
            "name": "ci",
            "triggers": { "schedule": [{"cron": "* * * * *"}] },
            "steps": [
                { "name": "build", "run": "echo hi" },
                { "name": "deploy", "run": "echo deploy", "if": "trigger == 'push'" },
            ],
        });
        let mut pipeline = Pipeline::new(repo.id, "ci", config);
        pipeline.next_run_at = Some(UtcTimestamp::now());
        let pipeline = store.create_pipeline(pipeline).unwrap();

        tick(&store, &git);

        let runs = store.list_runs(pipeline.id).unwrap();
        let steps = store.list_steps(runs[0].id).unwrap();
        assert_eq!(steps[0].status, eifl_types::StepStatus::Pending);
        assert_eq!(steps[1].status, eifl_types::StepStatus::Skipped);
    }

    #[test]
    fn tick_skips_pipeline_with_no_resolvable_head() {
        let store = InMemoryStore::new();
        let git = FakeGitAdapter::new();
        let project = store.create_project(Project::new("demo", None)).unwrap();
        let repo = store.create_repo(Repo::new(project.id, "r", "r.git")).unwrap();
        // Deliberately not registering a HEAD for this repo.
        let config = serde_json::json!({
            "name": "ci",
            "triggers": { "schedule": [{"cron": "* * * * *"}] },
            "steps": [{"name": "build", "run": "echo hi"}],
        });
        let mut pipeline = Pipeline::new(repo.id, "ci", config);
        pipeline.next_run_at = Some(UtcTimestamp::now());
        let pipeline = store.create_pipeline(pipeline).unwrap();

        tick(&store, &git);

        assert!(store.list_runs(pipeline.id).unwrap().is_empty());
    }

    #[test]
    fn tick_does_not_enqueue_when_a_run_is_already_pending() {
        let store = InMemoryStore::new();
        let git = FakeGitAdapter::new();
        let pipeline = setup(&git, &store, "* * * * *");
        store.create_run(Run::new(pipeline.id, TriggeredBy::Manual, None, None)).unwrap();

        tick(&store, &git);

        let runs = store.list_runs(pipeline.id).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Pending);
    }
}

//! Push trigger (spec §4.F): invoked after a successful `git
//! receive-pack`, reads the manifest from the pushed commit, upserts the
//! pipeline, and enqueues a push-triggered run. Unlike the scheduler, no
//! duplicate suppression is performed — each push is an independent
//! event.

use eifl_store::Store;
use eifl_types::manifest::{StepConditionContext, evaluate_step_condition, should_trigger_on_push};
use eifl_types::{Pipeline, ReceivePackRecord, Run, Step, StepStatus, TriggeredBy, ZERO_SHA};

use crate::adapters::GitAdapter;
use crate::cron;

const MANIFEST_PATH: &str = ".eifl.json";

/// Handle one `git receive-pack` result: a batch of ref-update records.
/// Each record is independent; a failure or skip on one never aborts the
/// rest (spec §4.F / §7 batch-loop propagation policy).
pub fn handle_push(store: &dyn Store, git: &dyn GitAdapter, repo_id: eifl_types::RepoId, records: &[ReceivePackRecord]) {
    for record in records {
        if let Err(err) = handle_one_ref(store, git, repo_id, record) {
            tracing::warn!(refname = %record.refname, error = %err, "push trigger failed for ref, skipping");
        }
    }
}

fn handle_one_ref(
    store: &dyn Store,
    git: &dyn GitAdapter,
    repo_id: eifl_types::RepoId,
    record: &ReceivePackRecord,
) -> eifl_types::Result<()> {
    if record.newrev == ZERO_SHA {
        return Ok(());
    }
    let Some(branch) = record.branch_name() else {
        return Ok(());
    };

    let repo = store.get_repo(repo_id)?;

    let Some(bytes) = git.read_file_at_ref(&repo.path, &record.newrev, MANIFEST_PATH) else {
        tracing::warn!(repo_id = %repo_id, git_ref = %record.newrev, "no manifest at pushed commit, skipping");
        return Ok(());
    };
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| eifl_types::EiflError::validation("$", format!("manifest is not valid JSON: {e}")))?;
    let manifest = eifl_types::Manifest::parse(&value)?;

    if !should_trigger_on_push(&manifest, branch) {
        return Ok(());
    }

    let next_run_at = manifest
        .schedule_entries()
        .iter()
        .filter_map(|entry| cron::next_after(&entry.cron, chrono::Utc::now()).ok())
        .min();

    let pipelines = store.list_pipelines(repo_id)?;
    let pipeline = match pipelines.into_iter().find(|p| p.name == manifest.name) {
        Some(mut existing) => {
            existing.config = value;
            existing.next_run_at = next_run_at.map(eifl_types::UtcTimestamp::from);
            store.update_pipeline(existing)?
        }
        None => {
            let mut pipeline = Pipeline::new(repo_id, &manifest.name, value);
            pipeline.next_run_at = next_run_at.map(eifl_types::UtcTimestamp::from);
            store.create_pipeline(pipeline)?
        }
    };

    let run = store.create_run(Run::new(
        pipeline.id,
        TriggeredBy::Push,
        Some(record.newrev.clone()),
        Some(branch.to_string()),
    ))?;

    let ctx = StepConditionContext {
        trigger: run.triggered_by.as_str(),
        branch: run.branch.as_deref(),
    };
    create_steps_for_run(store, run.id, &manifest, ctx)?;

    Ok(())
}

/// Materialize one [`Step`] per manifest step in order, pre-marking any
/// step whose `if` condition evaluates false (or fails to parse) as
/// `skipped` (spec §4.C / §4.G). Shared by the push trigger and the
/// scheduler so both creation paths apply identical condition semantics
/// to the same manifest.
pub(crate) fn create_steps_for_run(
    store: &dyn Store,
    run_id: eifl_types::RunId,
    manifest: &eifl_types::Manifest,
    ctx: StepConditionContext<'_>,
) -> eifl_types::Result<()> {
    for (seq, step_def) in manifest.steps.iter().enumerate() {
        let mut step = Step::new(run_id, seq as u32, &step_def.name, &step_def.run);
        if let Some(condition) = &step_def.r#if
            && !evaluate_step_condition(condition, ctx)
        {
            step.status = StepStatus::Skipped;
            step.finished_at = Some(eifl_types::UtcTimestamp::now());
        }
        store.create_step(step)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::testing::FakeGitAdapter;
    use eifl_store::InMemoryStore;
    use eifl_types::{Project, Repo};

    fn push_manifest_json() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "name": "ci",
            "triggers": { "push": { "branches": ["main"] } },
            "steps": [
                { "name": "test", "run": "make test" },
                { "name": "bench", "run": "make bench", "if": "trigger == 'schedule'" },
            ],
        }))
        .unwrap()
    }

    fn setup() -> (InMemoryStore, FakeGitAdapter, eifl_types::RepoId) {
        let store = InMemoryStore::new();
        let git = FakeGitAdapter::new();
        let project = store.create_project(Project::new("demo", None)).unwrap();
        let repo = store.create_repo(Repo::new(project.id, "r", "r.git")).unwrap();
        git.put_file("r.git", "abc123", ".eifl.json", &push_manifest_json());
        (store, git, repo.id)
    }

    #[test]
    fn push_to_matching_branch_creates_pipeline_and_run() {
        let (store, git, repo_id) = setup();
        let records = vec![ReceivePackRecord {
            oldrev: ZERO_SHA.to_string(),
            newrev: "abc123".to_string(),
            refname: "refs/heads/main".to_string(),
        }];

        handle_push(&store, &git, repo_id, &records);

        let pipelines = store.list_pipelines(repo_id).unwrap();
        assert_eq!(pipelines.len(), 1);
        let runs = store.list_runs(pipelines[0].id).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].triggered_by, TriggeredBy::Push);
        assert_eq!(runs[0].commit_sha.as_deref(), Some("abc123"));
    }

    #[test]
    fn push_triggered_run_skips_schedule_only_step() {
        let (store, git, repo_id) = setup();
        let records = vec![ReceivePackRecord {
            oldrev: ZERO_SHA.to_string(),
            newrev: "abc123".to_string(),
            refname: "refs/heads/main".to_string(),
        }];

        handle_push(&store, &git, repo_id, &records);

        let pipelines = store.list_pipelines(repo_id).unwrap();
        let runs = store.list_runs(pipelines[0].id).unwrap();
        let steps = store.list_steps(runs[0].id).unwrap();

        assert_eq!(steps[0].status, StepStatus::Pending);
        assert_eq!(steps[1].status, StepStatus::Skipped);
    }

    #[test]
    fn push_to_non_matching_branch_is_skipped() {
        let (store, git, repo_id) = setup();
        git.put_file("r.git", "def456", ".eifl.json", &push_manifest_json());
        let records = vec![ReceivePackRecord {
            oldrev: ZERO_SHA.to_string(),
            newrev: "def456".to_string(),
            refname: "refs/heads/develop".to_string(),
        }];

        handle_push(&store, &git, repo_id, &records);

        assert!(store.list_pipelines(repo_id).unwrap().is_empty());
    }

    #[test]
    fn deleted_ref_is_ignored() {
        let (store, git, repo_id) = setup();
        let records = vec![ReceivePackRecord {
            oldrev: "abc123".to_string(),
            newrev: ZERO_SHA.to_string(),
            refname: "refs/heads/main".to_string(),
        }];

        handle_push(&store, &git, repo_id, &records);

        assert!(store.list_pipelines(repo_id).unwrap().is_empty());
    }

    #[test]
    fn repeated_pushes_each_create_an_independent_run() {
        let (store, git, repo_id) = setup();
        let record = ReceivePackRecord {
            oldrev: ZERO_SHA.to_string(),
            newrev: "abc123".to_string(),
            refname: "refs/heads/main".to_string(),
        };

        handle_push(&store, &git, repo_id, std::slice::from_ref(&record));
        handle_push(&store, &git, repo_id, std::slice::from_ref(&record));

        let pipelines = store.list_pipelines(repo_id).unwrap();
        assert_eq!(pipelines.len(), 1, "push upserts the same pipeline by name");
        let runs = store.list_runs(pipelines[0].id).unwrap();
        assert_eq!(runs.len(), 2, "each push independently enqueues a run, no dedup");
    }
}

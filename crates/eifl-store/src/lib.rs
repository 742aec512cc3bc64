//! # eifl-store
//!
//! The `Store` trait abstracts persistence for every entity in the EIFL
//! data model, and [`InMemoryStore`] is the one implementation supplied
//! here — a single `Mutex`-guarded table set standing in for the durable
//! SQLite-backed store the full system would ship. Every multi-row effect
//! (reservation, cascade delete) takes that one lock for its entire
//! critical section, which is the systems-language analogue of a
//! serializable database transaction.
//!
//! A future on-disk implementation would satisfy the same trait, the way
//! `shipper-store::StateStore` separates the storage contract from the
//! filesystem-backed `FileStore`.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use eifl_types::{
    Baseline, BaselineId, EiflError, Metric, MetricId, Pipeline, PipelineId, Project, ProjectId,
    Repo, RepoId, Result, Run, RunId, RunStatus, Runner, RunnerId, RunnerStatus, Secret, SecretId,
    SecretScope, Step, StepId,
};

/// Persistence contract for the EIFL data model.
///
/// Implementations must be safe to share across runner-poll threads: the
/// dispatcher's reservation step and the scheduler's tick both call these
/// methods concurrently.
pub trait Store: Send + Sync {
    fn create_project(&self, project: Project) -> Result<Project>;
    fn get_project(&self, id: ProjectId) -> Result<Project>;
    fn list_projects(&self) -> Result<Vec<Project>>;
    fn delete_project(&self, id: ProjectId) -> Result<()>;

    fn create_repo(&self, repo: Repo) -> Result<Repo>;
    fn get_repo(&self, id: RepoId) -> Result<Repo>;
    fn list_repos(&self, project_id: ProjectId) -> Result<Vec<Repo>>;
    fn delete_repo(&self, id: RepoId) -> Result<()>;

    fn create_pipeline(&self, pipeline: Pipeline) -> Result<Pipeline>;
    fn get_pipeline(&self, id: PipelineId) -> Result<Pipeline>;
    fn list_pipelines(&self, repo_id: RepoId) -> Result<Vec<Pipeline>>;
    fn update_pipeline(&self, pipeline: Pipeline) -> Result<Pipeline>;
    fn delete_pipeline(&self, id: PipelineId) -> Result<()>;

    fn create_run(&self, run: Run) -> Result<Run>;
    fn get_run(&self, id: RunId) -> Result<Run>;
    fn list_runs(&self, pipeline_id: PipelineId) -> Result<Vec<Run>>;
    fn update_run(&self, run: Run) -> Result<Run>;

    fn create_step(&self, step: Step) -> Result<Step>;
    fn get_step(&self, id: StepId) -> Result<Step>;
    fn list_steps(&self, run_id: RunId) -> Result<Vec<Step>>;
    fn update_step(&self, step: Step) -> Result<Step>;

    fn create_metric(&self, metric: Metric) -> Result<Metric>;
    fn list_metrics(&self, run_id: RunId) -> Result<Vec<Metric>>;

    fn upsert_baseline(&self, baseline: Baseline) -> Result<Baseline>;
    fn get_baseline(&self, pipeline_id: PipelineId, key: &str) -> Result<Option<Baseline>>;
    fn list_baselines(&self, pipeline_id: PipelineId) -> Result<Vec<Baseline>>;

    fn create_runner(&self, runner: Runner) -> Result<Runner>;
    fn get_runner(&self, id: RunnerId) -> Result<Runner>;
    fn get_runner_by_token(&self, token: &str) -> Result<Runner>;
    fn list_runners(&self) -> Result<Vec<Runner>>;
    fn update_runner(&self, runner: Runner) -> Result<Runner>;

    fn create_secret(&self, secret: Secret) -> Result<Secret>;
    fn get_secret(&self, id: SecretId) -> Result<Secret>;
    fn list_secrets(&self, scope: SecretScope, scope_id: uuid::Uuid) -> Result<Vec<Secret>>;
    fn delete_secret(&self, id: SecretId) -> Result<()>;

    /// Atomically reserve the first pending run for which `matches` returns
    /// true, transitioning it to `running` in the same critical section.
    /// Returns `Ok(None)` if no pending run satisfies `matches`.
    fn reserve_run_for_runner(
        &self,
        runner_id: RunnerId,
        matches: &dyn Fn(&Run, &Pipeline) -> bool,
    ) -> Result<Option<Run>>;

    fn increment_active_jobs(&self, runner_id: RunnerId) -> Result<()>;
    fn decrement_active_jobs(&self, runner_id: RunnerId) -> Result<()>;

    fn has_pending_or_running_run(&self, pipeline_id: PipelineId) -> Result<bool>;
    fn pipelines_due(&self, now: DateTime<Utc>) -> Result<Vec<Pipeline>>;
}

#[derive(Default)]
struct Tables {
    projects: HashMap<ProjectId, Project>,
    repos: HashMap<RepoId, Repo>,
    pipelines: HashMap<PipelineId, Pipeline>,
    runs: HashMap<RunId, Run>,
    steps: HashMap<StepId, Step>,
    metrics: HashMap<MetricId, Metric>,
    baselines: HashMap<BaselineId, Baseline>,
    runners: HashMap<RunnerId, Runner>,
    secrets: HashMap<SecretId, Secret>,
}

/// In-memory `Store`, a single mutex guarding plain hash maps. Every
/// operation that must observe or mutate more than one table — cascade
/// deletes, the dispatcher's conditional reservation — takes the lock once
/// for the whole operation.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Store for InMemoryStore {
    fn create_project(&self, project: Project) -> Result<Project> {
        let mut t = self.lock();
        if t.projects.values().any(|p| p.name == project.name) {
            return Err(EiflError::Conflict(format!("project name `{}` already exists", project.name)));
        }
        t.projects.insert(project.id, project.clone());
        Ok(project)
    }

    fn get_project(&self, id: ProjectId) -> Result<Project> {
        self.lock()
            .projects
            .get(&id)
            .cloned()
            .ok_or_else(|| EiflError::not_found("project", id))
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.lock().projects.values().cloned().collect())
    }

    fn delete_project(&self, id: ProjectId) -> Result<()> {
        let mut t = self.lock();
        t.projects.remove(&id);
        let repo_ids: Vec<RepoId> = t.repos.values().filter(|r| r.project_id == id).map(|r| r.id).collect();
        for repo_id in repo_ids {
            cascade_delete_repo(&mut t, repo_id);
        }
        tracing::info!(project_id = %id, "deleted project and cascaded children");
        Ok(())
    }

    fn create_repo(&self, repo: Repo) -> Result<Repo> {
        let mut t = self.lock();
        if !t.projects.contains_key(&repo.project_id) {
            return Err(EiflError::not_found("project", repo.project_id));
        }
        if t.repos.values().any(|r| r.project_id == repo.project_id && r.name == repo.name) {
            return Err(EiflError::Conflict(format!(
                "repo name `{}` already exists in this project",
                repo.name
            )));
        }
        if t.repos.values().any(|r| r.path == repo.path) {
            return Err(EiflError::Conflict(format!("repo path `{}` already exists", repo.path)));
        }
        t.repos.insert(repo.id, repo.clone());
        Ok(repo)
    }

    fn get_repo(&self, id: RepoId) -> Result<Repo> {
        self.lock().repos.get(&id).cloned().ok_or_else(|| EiflError::not_found("repo", id))
    }

    fn list_repos(&self, project_id: ProjectId) -> Result<Vec<Repo>> {
        Ok(self.lock().repos.values().filter(|r| r.project_id == project_id).cloned().collect())
    }

    fn delete_repo(&self, id: RepoId) -> Result<()> {
        let mut t = self.lock();
        cascade_delete_repo(&mut t, id);
        Ok(())
    }

    fn create_pipeline(&self, pipeline: Pipeline) -> Result<Pipeline> {
        let mut t = self.lock();
        if !t.repos.contains_key(&pipeline.repo_id) {
            return Err(EiflError::not_found("repo", pipeline.repo_id));
        }
        if t.pipelines.values().any(|p| p.repo_id == pipeline.repo_id && p.name == pipeline.name) {
            return Err(EiflError::Conflict(format!(
                "pipeline name `{}` already exists for this repo",
                pipeline.name
            )));
        }
        t.pipelines.insert(pipeline.id, pipeline.clone());
        Ok(pipeline)
    }

    fn get_pipeline(&self, id: PipelineId) -> Result<Pipeline> {
        self.lock()
            .pipelines
            .get(&id)
            .cloned()
            .ok_or_else(|| EiflError::not_found("pipeline", id))
    }

    fn list_pipelines(&self, repo_id: RepoId) -> Result<Vec<Pipeline>> {
        Ok(self.lock().pipelines.values().filter(|p| p.repo_id == repo_id).cloned().collect())
    }

    fn update_pipeline(&self, pipeline: Pipeline) -> Result<Pipeline> {
        let mut t = self.lock();
        if !t.pipelines.contains_key(&pipeline.id) {
            return Err(EiflError::not_found("pipeline", pipeline.id));
        }
        t.pipelines.insert(pipeline.id, pipeline.clone());
        Ok(pipeline)
    }

    fn delete_pipeline(&self, id: PipelineId) -> Result<()> {
        let mut t = self.lock();
        cascade_delete_pipeline(&mut t, id);
        Ok(())
    }

    fn create_run(&self, run: Run) -> Result<Run> {
        let mut t = self.lock();
        t.runs.insert(run.id, run.clone());
        Ok(run)
    }

    fn get_run(&self, id: RunId) -> Result<Run> {
        self.lock().runs.get(&id).cloned().ok_or_else(|| EiflError::not_found("run", id))
    }

    fn list_runs(&self, pipeline_id: PipelineId) -> Result<Vec<Run>> {
        Ok(self.lock().runs.values().filter(|r| r.pipeline_id == pipeline_id).cloned().collect())
    }

    fn update_run(&self, run: Run) -> Result<Run> {
        let mut t = self.lock();
        if !t.runs.contains_key(&run.id) {
            return Err(EiflError::not_found("run", run.id));
        }
        t.runs.insert(run.id, run.clone());
        Ok(run)
    }

    fn create_step(&self, step: Step) -> Result<Step> {
        let mut t = self.lock();
        t.steps.insert(step.id, step.clone());
        Ok(step)
    }

    fn get_step(&self, id: StepId) -> Result<Step> {
        self.lock().steps.get(&id).cloned().ok_or_else(|| EiflError::not_found("step", id))
    }

    fn list_steps(&self, run_id: RunId) -> Result<Vec<Step>> {
        let mut steps: Vec<Step> = self.lock().steps.values().filter(|s| s.run_id == run_id).cloned().collect();
        steps.sort_by_key(|s| s.seq);
        Ok(steps)
    }

    fn update_step(&self, step: Step) -> Result<Step> {
        let mut t = self.lock();
        if !t.steps.contains_key(&step.id) {
            return Err(EiflError::not_found("step", step.id));
        }
        t.steps.insert(step.id, step.clone());
        Ok(step)
    }

    fn create_metric(&self, metric: Metric) -> Result<Metric> {
        let mut t = self.lock();
        t.metrics.insert(metric.id, metric.clone());
        Ok(metric)
    }

    fn list_metrics(&self, run_id: RunId) -> Result<Vec<Metric>> {
        Ok(self.lock().metrics.values().filter(|m| m.run_id == run_id).cloned().collect())
    }

    fn upsert_baseline(&self, baseline: Baseline) -> Result<Baseline> {
        let mut t = self.lock();
        if let Some(existing) = t
            .baselines
            .values_mut()
            .find(|b| b.pipeline_id == baseline.pipeline_id && b.key == baseline.key)
        {
            existing.baseline_value = baseline.baseline_value;
            existing.tolerance_pct = baseline.tolerance_pct;
            existing.updated_at = baseline.updated_at;
            return Ok(existing.clone());
        }
        t.baselines.insert(baseline.id, baseline.clone());
        Ok(baseline)
    }

    fn get_baseline(&self, pipeline_id: PipelineId, key: &str) -> Result<Option<Baseline>> {
        Ok(self
            .lock()
            .baselines
            .values()
            .find(|b| b.pipeline_id == pipeline_id && b.key == key)
            .cloned())
    }

    fn list_baselines(&self, pipeline_id: PipelineId) -> Result<Vec<Baseline>> {
        Ok(self.lock().baselines.values().filter(|b| b.pipeline_id == pipeline_id).cloned().collect())
    }

    fn create_runner(&self, runner: Runner) -> Result<Runner> {
        let mut t = self.lock();
        if t.runners.values().any(|r| r.name == runner.name) {
            return Err(EiflError::Conflict(format!("runner name `{}` already exists", runner.name)));
        }
        if t.runners.values().any(|r| r.token == runner.token) {
            return Err(EiflError::Conflict("runner token already in use".to_string()));
        }
        t.runners.insert(runner.id, runner.clone());
        Ok(runner)
    }

    fn get_runner(&self, id: RunnerId) -> Result<Runner> {
        self.lock().runners.get(&id).cloned().ok_or_else(|| EiflError::not_found("runner", id))
    }

    fn get_runner_by_token(&self, token: &str) -> Result<Runner> {
        self.lock()
            .runners
            .values()
            .find(|r| r.token == token)
            .cloned()
            .ok_or_else(|| EiflError::Unauthorized("unknown runner token".to_string()))
    }

    fn list_runners(&self) -> Result<Vec<Runner>> {
        Ok(self.lock().runners.values().cloned().collect())
    }

    fn update_runner(&self, runner: Runner) -> Result<Runner> {
        let mut t = self.lock();
        if !t.runners.contains_key(&runner.id) {
            return Err(EiflError::not_found("runner", runner.id));
        }
        t.runners.insert(runner.id, runner.clone());
        Ok(runner)
    }

    fn create_secret(&self, secret: Secret) -> Result<Secret> {
        eifl_types::secret::validate_secret_name(&secret.name)?;
        let mut t = self.lock();
        if t.secrets
            .values()
            .any(|s| s.scope == secret.scope && s.scope_id == secret.scope_id && s.name == secret.name)
        {
            return Err(EiflError::Conflict(format!(
                "secret `{}` already exists at this scope",
                secret.name
            )));
        }
        t.secrets.insert(secret.id, secret.clone());
        Ok(secret)
    }

    fn get_secret(&self, id: SecretId) -> Result<Secret> {
        self.lock().secrets.get(&id).cloned().ok_or_else(|| EiflError::not_found("secret", id))
    }

    fn list_secrets(&self, scope: SecretScope, scope_id: uuid::Uuid) -> Result<Vec<Secret>> {
        Ok(self
            .lock()
            .secrets
            .values()
            .filter(|s| s.scope == scope && s.scope_id == scope_id)
            .cloned()
            .collect())
    }

    fn delete_secret(&self, id: SecretId) -> Result<()> {
        self.lock().secrets.remove(&id);
        Ok(())
    }

    fn reserve_run_for_runner(
        &self,
        runner_id: RunnerId,
        matches: &dyn Fn(&Run, &Pipeline) -> bool,
    ) -> Result<Option<Run>> {
        let mut t = self.lock();

        let mut candidate_ids: Vec<RunId> = t
            .runs
            .values()
            .filter(|r| r.status == RunStatus::Pending)
            .map(|r| r.id)
            .collect();
        candidate_ids.sort_by_key(|id| t.runs[id].created_at.inner());

        for run_id in candidate_ids {
            let pipeline = {
                let run = &t.runs[&run_id];
                match t.pipelines.get(&run.pipeline_id) {
                    Some(p) => p.clone(),
                    None => continue,
                }
            };

            let eligible = {
                let run = &t.runs[&run_id];
                matches(run, &pipeline)
            };
            if !eligible {
                continue;
            }

            // The conditional-update analogue: only claim the run if it is
            // still `pending` at the moment we hold the lock to flip it.
            let run = t.runs.get_mut(&run_id).expect("run exists");
            if run.status != RunStatus::Pending {
                continue;
            }
            run.status = RunStatus::Running;
            run.started_at = Some(eifl_types::UtcTimestamp::now());
            let reserved = run.clone();

            if let Some(runner) = t.runners.get_mut(&runner_id) {
                runner.active_jobs += 1;
                runner.status = if runner.active_jobs >= runner.max_concurrency {
                    RunnerStatus::Busy
                } else {
                    RunnerStatus::Online
                };
            }

            tracing::debug!(run_id = %run_id, runner_id = %runner_id, "reserved pending run");
            return Ok(Some(reserved));
        }

        Ok(None)
    }

    fn increment_active_jobs(&self, runner_id: RunnerId) -> Result<()> {
        let mut t = self.lock();
        let runner = t.runners.get_mut(&runner_id).ok_or_else(|| EiflError::not_found("runner", runner_id))?;
        runner.active_jobs += 1;
        Ok(())
    }

    fn decrement_active_jobs(&self, runner_id: RunnerId) -> Result<()> {
        let mut t = self.lock();
        let runner = t.runners.get_mut(&runner_id).ok_or_else(|| EiflError::not_found("runner", runner_id))?;
        runner.active_jobs = runner.active_jobs.saturating_sub(1);
        Ok(())
    }

    fn has_pending_or_running_run(&self, pipeline_id: PipelineId) -> Result<bool> {
        Ok(self
            .lock()
            .runs
            .values()
            .any(|r| r.pipeline_id == pipeline_id && r.is_pending_or_running()))
    }

    fn pipelines_due(&self, now: DateTime<Utc>) -> Result<Vec<Pipeline>> {
        Ok(self
            .lock()
            .pipelines
            .values()
            .filter(|p| matches!(p.next_run_at, Some(ts) if ts.inner() <= now))
            .cloned()
            .collect())
    }
}

fn cascade_delete_repo(t: &mut Tables, repo_id: RepoId) {
    t.repos.remove(&repo_id);
    let pipeline_ids: Vec<PipelineId> =
        t.pipelines.values().filter(|p| p.repo_id == repo_id).map(|p| p.id).collect();
    for pipeline_id in pipeline_ids {
        cascade_delete_pipeline(t, pipeline_id);
    }
}

fn cascade_delete_pipeline(t: &mut Tables, pipeline_id: PipelineId) {
    t.pipelines.remove(&pipeline_id);
    let run_ids: Vec<RunId> = t.runs.values().filter(|r| r.pipeline_id == pipeline_id).map(|r| r.id).collect();
    for run_id in run_ids {
        t.runs.remove(&run_id);
        let step_ids: Vec<StepId> = t.steps.values().filter(|s| s.run_id == run_id).map(|s| s.id).collect();
        for step_id in step_ids {
            t.steps.remove(&step_id);
        }
        let metric_ids: Vec<MetricId> = t.metrics.values().filter(|m| m.run_id == run_id).map(|m| m.id).collect();
        for metric_id in metric_ids {
            t.metrics.remove(&metric_id);
        }
    }
    let baseline_ids: Vec<BaselineId> =
        t.baselines.values().filter(|b| b.pipeline_id == pipeline_id).map(|b| b.id).collect();
    for baseline_id in baseline_ids {
        t.baselines.remove(&baseline_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eifl_types::TriggeredBy;

    fn sample_project_repo_pipeline(store: &InMemoryStore) -> (Project, Repo, Pipeline) {
        let project = store.create_project(Project::new("demo", None)).unwrap();
        let repo = store.create_repo(Repo::new(project.id, "demo-repo", "demo-repo.git")).unwrap();
        let config = serde_json::json!({"name": "ci", "steps": [{"name": "build", "run": "echo hi"}]});
        let pipeline = store.create_pipeline(Pipeline::new(repo.id, "ci", config)).unwrap();
        (project, repo, pipeline)
    }

    #[test]
    fn create_and_get_round_trip() {
        let store = InMemoryStore::new();
        let (_, _, pipeline) = sample_project_repo_pipeline(&store);
        let fetched = store.get_pipeline(pipeline.id).unwrap();
        assert_eq!(fetched.id, pipeline.id);
    }

    #[test]
    fn get_missing_entity_returns_not_found() {
        let store = InMemoryStore::new();
        let err = store.get_project(ProjectId::new()).unwrap_err();
        assert!(matches!(err, EiflError::NotFound { kind: "project", .. }));
    }

    #[test]
    fn delete_project_cascades_through_repo_pipeline_run_step() {
        let store = InMemoryStore::new();
        let (project, repo, pipeline) = sample_project_repo_pipeline(&store);
        let run = store.create_run(Run::new(pipeline.id, TriggeredBy::Manual, None, None)).unwrap();
        let step = store.create_step(Step::new(run.id, 0, "build", "echo hi")).unwrap();

        store.delete_project(project.id).unwrap();

        assert!(store.get_repo(repo.id).is_err());
        assert!(store.get_pipeline(pipeline.id).is_err());
        assert!(store.get_run(run.id).is_err());
        assert!(store.get_step(step.id).is_err());
    }

    #[test]
    fn reserve_run_for_runner_claims_first_eligible_pending_run() {
        let store = InMemoryStore::new();
        let (_, _, pipeline) = sample_project_repo_pipeline(&store);
        let runner = store.create_runner(Runner::new("r1", "tok1", 2)).unwrap();
        let run = store.create_run(Run::new(pipeline.id, TriggeredBy::Manual, None, None)).unwrap();

        let reserved = store.reserve_run_for_runner(runner.id, &|_, _| true).unwrap();
        assert_eq!(reserved.unwrap().id, run.id);

        let refetched = store.get_run(run.id).unwrap();
        assert_eq!(refetched.status, RunStatus::Running);

        let refetched_runner = store.get_runner(runner.id).unwrap();
        assert_eq!(refetched_runner.active_jobs, 1);
        assert_eq!(refetched_runner.status, RunnerStatus::Online);
    }

    #[test]
    fn reserve_run_for_runner_returns_none_when_no_run_matches() {
        let store = InMemoryStore::new();
        let (_, _, pipeline) = sample_project_repo_pipeline(&store);
        let runner = store.create_runner(Runner::new("r1", "tok1", 1)).unwrap();
        store.create_run(Run::new(pipeline.id, TriggeredBy::Manual, None, None)).unwrap();

        let reserved = store.reserve_run_for_runner(runner.id, &|_, _| false).unwrap();
        assert!(reserved.is_none());
    }

    #[test]
    fn reserve_run_for_runner_sets_busy_at_capacity() {
        let store = InMemoryStore::new();
        let (_, _, pipeline) = sample_project_repo_pipeline(&store);
        let runner = store.create_runner(Runner::new("r1", "tok1", 1)).unwrap();
        store.create_run(Run::new(pipeline.id, TriggeredBy::Manual, None, None)).unwrap();

        store.reserve_run_for_runner(runner.id, &|_, _| true).unwrap();

        let refetched = store.get_runner(runner.id).unwrap();
        assert_eq!(refetched.status, RunnerStatus::Busy);
    }

    #[test]
    fn decrement_active_jobs_clamps_at_zero() {
        let store = InMemoryStore::new();
        let runner = store.create_runner(Runner::new("r1", "tok1", 2)).unwrap();
        store.decrement_active_jobs(runner.id).unwrap();
        assert_eq!(store.get_runner(runner.id).unwrap().active_jobs, 0);
    }

    #[test]
    fn has_pending_or_running_run_reflects_terminal_transitions() {
        let store = InMemoryStore::new();
        let (_, _, pipeline) = sample_project_repo_pipeline(&store);
        assert!(!store.has_pending_or_running_run(pipeline.id).unwrap());

        let mut run = store.create_run(Run::new(pipeline.id, TriggeredBy::Manual, None, None)).unwrap();
        assert!(store.has_pending_or_running_run(pipeline.id).unwrap());

        run.status = RunStatus::Success;
        store.update_run(run).unwrap();
        assert!(!store.has_pending_or_running_run(pipeline.id).unwrap());
    }

    #[test]
    fn create_project_rejects_duplicate_name() {
        let store = InMemoryStore::new();
        store.create_project(Project::new("demo", None)).unwrap();
        let err = store.create_project(Project::new("demo", None)).unwrap_err();
        assert!(matches!(err, EiflError::Conflict(_)));
    }

    #[test]
    fn create_repo_rejects_duplicate_name_within_project_but_allows_across_projects() {
        let store = InMemoryStore::new();
        let project_a = store.create_project(Project::new("a", None)).unwrap();
        let project_b = store.create_project(Project::new("b", None)).unwrap();
        store.create_repo(Repo::new(project_a.id, "widgets", "a/widgets.git")).unwrap();

        let err = store.create_repo(Repo::new(project_a.id, "widgets", "a/widgets-2.git")).unwrap_err();
        assert!(matches!(err, EiflError::Conflict(_)));

        assert!(store.create_repo(Repo::new(project_b.id, "widgets", "b/widgets.git")).is_ok());
    }

    #[test]
    fn create_repo_rejects_duplicate_path() {
        let store = InMemoryStore::new();
        let project = store.create_project(Project::new("demo", None)).unwrap();
        store.create_repo(Repo::new(project.id, "a", "shared.git")).unwrap();
        let err = store.create_repo(Repo::new(project.id, "b", "shared.git")).unwrap_err();
        assert!(matches!(err, EiflError::Conflict(_)));
    }

    #[test]
    fn create_pipeline_rejects_duplicate_name_within_repo() {
        let store = InMemoryStore::new();
        let (_, repo, _) = sample_project_repo_pipeline(&store);
        let config = serde_json::json!({"name": "ci", "steps": [{"name": "build", "run": "echo hi"}]});
        let err = store.create_pipeline(Pipeline::new(repo.id, "ci", config)).unwrap_err();
        assert!(matches!(err, EiflError::Conflict(_)));
    }

    #[test]
    fn create_runner_rejects_duplicate_name_and_token() {
        let store = InMemoryStore::new();
        store.create_runner(Runner::new("r1", "tok1", 1)).unwrap();
        assert!(matches!(
            store.create_runner(Runner::new("r1", "tok2", 1)).unwrap_err(),
            EiflError::Conflict(_)
        ));
        assert!(matches!(
            store.create_runner(Runner::new("r2", "tok1", 1)).unwrap_err(),
            EiflError::Conflict(_)
        ));
    }

    #[test]
    fn create_secret_rejects_invalid_name_and_duplicate_scope() {
        let store = InMemoryStore::new();
        let (project, _, _) = sample_project_repo_pipeline(&store);

        let bad_name = Secret {
            id: SecretId::new(),
            scope: SecretScope::Project,
            scope_id: project.id.0,
            name: "lowercase".to_string(),
            encrypted_value: "ct".to_string(),
            iv: "iv".to_string(),
            created_at: eifl_types::UtcTimestamp::now(),
            updated_at: eifl_types::UtcTimestamp::now(),
        };
        assert!(matches!(store.create_secret(bad_name).unwrap_err(), EiflError::Validation { .. }));

        let first = Secret {
            id: SecretId::new(),
            scope: SecretScope::Project,
            scope_id: project.id.0,
            name: "TOKEN".to_string(),
            encrypted_value: "ct".to_string(),
            iv: "iv".to_string(),
            created_at: eifl_types::UtcTimestamp::now(),
            updated_at: eifl_types::UtcTimestamp::now(),
        };
        store.create_secret(first).unwrap();

        let duplicate = Secret {
            id: SecretId::new(),
            scope: SecretScope::Project,
            scope_id: project.id.0,
            name: "TOKEN".to_string(),
            encrypted_value: "ct2".to_string(),
            iv: "iv2".to_string(),
            created_at: eifl_types::UtcTimestamp::now(),
            updated_at: eifl_types::UtcTimestamp::now(),
        };
        assert!(matches!(store.create_secret(duplicate).unwrap_err(), EiflError::Conflict(_)));
    }

    #[test]
    fn pipelines_due_filters_by_next_run_at() {
        let store = InMemoryStore::new();
        let (_, repo, _) = sample_project_repo_pipeline(&store);
        let config = serde_json::json!({"name": "ci", "steps": [{"name": "build", "run": "echo hi"}]});
        let mut due = Pipeline::new(repo.id, "due", config.clone());
        due.next_run_at = Some(eifl_types::UtcTimestamp::now());
        let due = store.create_pipeline(due).unwrap();

        let mut not_due = Pipeline::new(repo.id, "not-due", config);
        not_due.next_run_at = None;
        store.create_pipeline(not_due).unwrap();

        let due_pipelines = store.pipelines_due(chrono::Utc::now()).unwrap();
        assert_eq!(due_pipelines.len(), 1);
        assert_eq!(due_pipelines[0].id, due.id);
    }
}

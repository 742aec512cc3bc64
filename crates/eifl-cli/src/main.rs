use std::process::ExitCode;

use clap::{Parser, Subcommand};
use eifl_store::{InMemoryStore, Store};
use eifl_types::{Pipeline, Project, ReceivePackRecord, Repo, Run, Runner, TriggeredBy};

#[derive(Parser, Debug)]
#[command(name = "eifl-cli", version)]
#[command(about = "Operator tooling for the EIFL CI core")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the next N fire times for a five-field cron expression.
    CronNext {
        expr: String,
        #[arg(long, default_value_t = 5)]
        count: u32,
    },
    /// Encrypt a value with EIFL_ENCRYPTION_KEY, printing ciphertext and IV (both base64).
    SecretEncrypt { value: String },
    /// Decrypt a ciphertext/IV pair produced by `secret-encrypt`.
    SecretDecrypt {
        ciphertext_b64: String,
        iv_b64: String,
        #[arg(long, default_value = "SECRET")]
        name: String,
    },
    /// Run one push → schedule → dispatch → complete cycle against an
    /// in-process store and print what happened at each stage. Nothing
    /// persists past the single invocation.
    Demo,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.cmd {
        Commands::CronNext { expr, count } => cron_next(&expr, count),
        Commands::SecretEncrypt { value } => secret_encrypt(&value),
        Commands::SecretDecrypt { ciphertext_b64, iv_b64, name } => secret_decrypt(&ciphertext_b64, &iv_b64, &name),
        Commands::Demo => demo(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn cron_next(expr: &str, count: u32) -> eifl_types::Result<()> {
    let mut reference = chrono::Utc::now();
    for _ in 0..count {
        let next = eifl::cron::next_after(expr, reference)?;
        println!("{}", next.to_rfc3339());
        reference = next;
    }
    Ok(())
}

fn secret_encrypt(value: &str) -> eifl_types::Result<()> {
    let encrypted = eifl_encrypt::encrypt(value)?;
    println!("ciphertext: {}", encrypted.ciphertext_b64);
    println!("iv:         {}", encrypted.iv_b64);
    Ok(())
}

fn secret_decrypt(ciphertext_b64: &str, iv_b64: &str, name: &str) -> eifl_types::Result<()> {
    let plaintext = eifl_encrypt::decrypt(ciphertext_b64, iv_b64, name)?;
    println!("{plaintext}");
    Ok(())
}

fn demo() -> eifl_types::Result<()> {
    let store = InMemoryStore::new();
    let git = eifl::adapters::testing::FakeGitAdapter::new();

    let project = store.create_project(Project::new("demo-project", None))?;
    let repo = store.create_repo(Repo::new(project.id, "widgets", "widgets.git"))?;
    git.set_head("widgets.git", "main", "c0ffee");
    git.put_file(
        "widgets.git",
        "c0ffee",
        ".eifl.json",
        serde_json::to_vec(&serde_json::json!({
            "name": "ci",
            "triggers": { "push": { "branches": ["main"] } },
            "steps": [{"name": "build", "run": "cargo build"}, {"name": "test", "run": "cargo test"}],
        }))
        .expect("demo manifest serializes")
        .as_slice(),
    );

    println!("== push ==");
    eifl::trigger::handle_push(
        &store,
        &git,
        repo.id,
        &[ReceivePackRecord {
            oldrev: eifl_types::ZERO_SHA.to_string(),
            newrev: "c0ffee".to_string(),
            refname: "refs/heads/main".to_string(),
        }],
    );
    let pipeline: Pipeline = store.list_pipelines(repo.id)?.into_iter().next().expect("push created a pipeline");
    let run: Run = store.list_runs(pipeline.id)?.into_iter().next().expect("push created a run");
    println!("pipeline {} run {} ({})", pipeline.name, run.id, run.status);

    println!("== dispatch ==");
    let runner = store.create_runner(Runner::new("local-runner", "tok", 1))?;
    let job = eifl::dispatcher::poll(&store, runner.id, None)?.expect("the pending run is eligible");
    println!("dispatched run {} with {} steps", job.run.id, job.steps.len());

    println!("== complete ==");
    for step in &job.steps {
        eifl::runner::step_update(&store, runner.id, step.id, eifl_types::StepStatus::Success, Some(0), Some("ok\n"))?;
    }
    let summary = eifl::runner::run_complete(
        &store,
        runner.id,
        job.run.id,
        eifl_types::RunStatus::Success,
        &[eifl_types::ReportedMetric { key: "total_duration_ms".to_string(), value: 420.0, unit: Some("ms".to_string()) }],
    )?;
    println!("run complete, {} metrics checked against baselines, regressions={}", summary.checked, summary.has_regressions);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cron_next_prints_requested_count_without_error() {
        assert!(cron_next("* * * * *", 2).is_ok());
    }

    #[test]
    fn cron_next_reports_invalid_expressions() {
        assert!(cron_next("not a cron expression", 1).is_err());
    }

    #[test]
    fn secret_round_trip_via_env_key() {
        temp_env::with_var("EIFL_ENCRYPTION_KEY", Some("this-is-a-32-plus-character-secret-key"), || {
            assert!(secret_encrypt("hello").is_ok());
        });
    }

    #[test]
    fn demo_runs_end_to_end_without_error() {
        assert!(demo().is_ok());
    }
}

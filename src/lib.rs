// src/lib.rs

pub mod cli;
pub mod config;
pub mod cron;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::cron::validate_expression;
use crate::dag::validate::validate_dependencies;
use crate::engine::{ExecutorOptions, Scheduler, SchedulerOptions};
use crate::exec::ProcessLauncher;
use crate::store::SqliteStore;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the SQLite store
/// - the process launcher
/// - the scheduler loop (or a one-shot manual trigger / dry run)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let store = Arc::new(
        SqliteStore::open(&cfg.store.path)
            .with_context(|| format!("opening store at {}", cfg.store.path))?,
    );

    let base_dir = std::env::current_dir().context("resolving working directory")?;
    let launcher = Arc::new(ProcessLauncher::new(base_dir, &cfg.tasks.dags_dir));

    let options = SchedulerOptions {
        poll_interval: Duration::from_secs(cfg.scheduler.poll_interval_secs),
        executor: ExecutorOptions {
            wave_retry_delay: Duration::from_millis(cfg.scheduler.wave_retry_delay_ms),
        },
    };

    let scheduler = Scheduler::new(store, launcher, options);
    scheduler.reload()?;

    if args.dry_run {
        print_dry_run(&scheduler);
        return Ok(());
    }

    if let Some(dag_id) = args.trigger {
        let report = scheduler.trigger_manually(dag_id).await?;
        println!(
            "execution {} finished: {} ({} successful, {} failed)",
            report.execution_id,
            report.status.as_str(),
            report.succeeded,
            report.failed
        );
        return Ok(());
    }

    // Ctrl-C → graceful shutdown of the polling loop.
    tokio::select! {
        result = scheduler.run() => result.map_err(Into::into),
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested, stopping scheduler");
            Ok(())
        }
    }
}

/// Simple dry-run output: print loaded DAGs, tasks and validation results.
fn print_dry_run(scheduler: &Scheduler) {
    let dags = scheduler.active_dags().snapshot();
    println!("conduit dry-run");
    println!("dags ({}):", dags.len());

    for dag in dags {
        let deps_validity = match validate_dependencies(&dag) {
            Ok(()) => "ok".to_string(),
            Err(err) => format!("INVALID: {err}"),
        };
        let cron_validity = match validate_expression(&dag.cron_expression) {
            Ok(()) => "ok".to_string(),
            Err(err) => format!("INVALID: {err}"),
        };
        println!(
            "  - [{}] {} ({}) cron='{}' [{}] dependencies={}",
            dag.id,
            dag.name,
            dag.status.as_str(),
            dag.cron_expression,
            cron_validity,
            deps_validity
        );
        for task in &dag.tasks {
            let deps: Vec<String> = task
                .dependencies
                .iter()
                .map(|d| format!("{}({})", d.task_name, d.task_id))
                .collect();
            println!(
                "      task [{}] {} exec='{}' after={:?}",
                task.id, task.name, task.execution, deps
            );
        }
    }
}

// src/engine/scheduler.rs

//! The long-running scheduler loop.
//!
//! Owns the in-memory set of active DAGs, polls wall-clock time on a fixed
//! interval and dispatches every due DAG onto its own tokio task. The list
//! lock is only ever held across inspection or replacement, never across a
//! DAG's execution.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{error, info};

use crate::cron::matcher::{is_time_to_run, CronTime};
use crate::dag::model::{Dag, DagStatus};
use crate::engine::executor::{execute_dag, ExecutorOptions, RunReport};
use crate::errors::{ConduitError, Result};
use crate::exec::TaskLauncher;
use crate::store::Store;

/// Scheduler-owned set of loaded DAGs.
///
/// All access goes through `snapshot` / `replace` / `find_by_id`; the lock
/// itself is never exposed.
#[derive(Default)]
pub struct ActiveDags {
    inner: Mutex<Vec<Arc<Dag>>>,
}

impl ActiveDags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cheap clone of the current list (Arc per DAG).
    pub fn snapshot(&self) -> Vec<Arc<Dag>> {
        self.inner.lock().clone()
    }

    /// Atomically discard the old list and install a new one.
    pub fn replace(&self, dags: Vec<Dag>) {
        let dags: Vec<Arc<Dag>> = dags.into_iter().map(Arc::new).collect();
        *self.inner.lock() = dags;
    }

    pub fn find_by_id(&self, dag_id: i64) -> Option<Arc<Dag>> {
        self.inner.lock().iter().find(|d| d.id == dag_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Scheduler loop knobs.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// How often cron expressions are re-evaluated.
    pub poll_interval: Duration,
    pub executor: ExecutorOptions,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            executor: ExecutorOptions::default(),
        }
    }
}

/// The scheduler: active-DAG set plus the collaborators every run needs.
pub struct Scheduler {
    active: Arc<ActiveDags>,
    store: Arc<dyn Store>,
    launcher: Arc<dyn TaskLauncher>,
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn Store>,
        launcher: Arc<dyn TaskLauncher>,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            active: Arc::new(ActiveDags::new()),
            store,
            launcher,
            options,
        }
    }

    pub fn active_dags(&self) -> &ActiveDags {
        &self.active
    }

    /// Replace the whole active set from storage. Called at startup and on
    /// explicit reload.
    pub fn reload(&self) -> Result<()> {
        let dags = self.store.load_active_dags()?;
        info!(count = dags.len(), "loaded DAGs from store");
        self.active.replace(dags);
        Ok(())
    }

    /// Main loop; never returns under normal operation.
    pub async fn run(&self) -> Result<()> {
        info!(
            poll_interval_secs = self.options.poll_interval.as_secs(),
            "scheduler loop started"
        );

        loop {
            let now = CronTime::now();
            self.dispatch_due(&now);
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    /// DAGs that should run at the given time: status active and cron match.
    pub fn due_dags(&self, now: &CronTime) -> Vec<Arc<Dag>> {
        self.active
            .snapshot()
            .into_iter()
            .filter(|dag| {
                dag.status == DagStatus::Active && is_time_to_run(&dag.cron_expression, now)
            })
            .collect()
    }

    /// Launch one detached run per due DAG. Runs share no per-run state and
    /// never block the next tick; failures are logged inside the spawned
    /// task.
    pub fn dispatch_due(&self, now: &CronTime) -> usize {
        let due = self.due_dags(now);
        let dispatched = due.len();

        for dag in due {
            info!(dag = %dag.name, dag_id = dag.id, "DAG is scheduled to run");

            let store = Arc::clone(&self.store);
            let launcher = Arc::clone(&self.launcher);
            let executor_options = self.options.executor.clone();

            tokio::spawn(async move {
                if let Err(err) =
                    execute_dag(&dag, store.as_ref(), launcher.as_ref(), &executor_options).await
                {
                    error!(dag = %dag.name, error = %err, "DAG execution failed to start");
                }
            });
        }

        dispatched
    }

    /// Run one DAG synchronously, bypassing its cron schedule.
    ///
    /// Fails with `DagNotFound` unless an *active* DAG has that id; paused
    /// and inactive DAGs are not triggerable. The lock is released before
    /// execution starts; only the lookup holds it.
    pub async fn trigger_manually(&self, dag_id: i64) -> Result<RunReport> {
        let dag = self
            .active
            .find_by_id(dag_id)
            .filter(|dag| dag.status == DagStatus::Active)
            .ok_or(ConduitError::DagNotFound(dag_id))?;

        info!(dag = %dag.name, dag_id, "manually triggering DAG");
        execute_dag(
            &dag,
            self.store.as_ref(),
            self.launcher.as_ref(),
            &self.options.executor,
        )
        .await
    }
}

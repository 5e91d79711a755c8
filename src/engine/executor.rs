// src/engine/executor.rs

//! Drives one DAG run to completion.
//!
//! Wave execution is deliberately sequential: tasks in the same ready wave
//! run one at a time, matching the behaviour the execution records are
//! audited against. Concurrency lives one level up, where each due DAG gets
//! its own run.

use std::time::Duration;

use tracing::{info, warn};

use crate::dag::model::{Dag, DagExecution, DagStatus, ExecutionStatus, TaskExecution};
use crate::dag::validate::validate_dependencies;
use crate::engine::queue::ExecutionQueue;
use crate::errors::{ConduitError, Result};
use crate::exec::TaskLauncher;
use crate::store::Store;

/// Per-run executor knobs.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Pause between waves before re-checking readiness.
    pub wave_retry_delay: Duration,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            wave_retry_delay: Duration::from_millis(100),
        }
    }
}

/// Outcome of one DAG run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub succeeded: usize,
    pub failed: usize,
}

/// Execute one run of a DAG, honouring dependency order.
///
/// Dependencies are validated before any execution record is created, so a
/// bad DAG never produces a half-started run. Task failures are recorded
/// and abort the remainder of the run after the current wave; they never
/// propagate as errors. Status-write failures after the run has started are
/// logged and non-fatal (auditability suffers, progress does not).
pub async fn execute_dag(
    dag: &Dag,
    store: &dyn Store,
    launcher: &dyn TaskLauncher,
    options: &ExecutorOptions,
) -> Result<RunReport> {
    if dag.status != DagStatus::Active {
        return Err(ConduitError::InvalidDag {
            dag: dag.name.clone(),
            reason: format!("status is '{}', not active", dag.status.as_str()),
        });
    }

    info!(dag = %dag.name, "starting execution of DAG");
    validate_dependencies(dag)?;

    let execution = DagExecution::start(dag.id);
    // The initial run record must exist; without it nothing downstream is
    // attributable, so an insert failure aborts before any task starts.
    let execution_db_id = store.insert_execution(&execution)?;

    let mut queue = ExecutionQueue::new(dag);
    let total_tasks = dag.tasks.len();
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut deadlocked = false;

    while succeeded + failed < total_tasks {
        let ready = queue.ready_tasks();

        if ready.is_empty() {
            // A cycle escaped validation or state is corrupt; end the run
            // with whatever counts it has. Unresolved tasks stay unresolved.
            warn!(
                dag = %dag.name,
                remaining = queue.remaining(),
                "no ready tasks but work remains; possible deadlock"
            );
            deadlocked = true;
            break;
        }

        for task_id in ready {
            let Some(task) = dag.task_by_id(task_id) else {
                warn!(dag = %dag.name, task_id, "ready task missing from DAG; skipping");
                continue;
            };

            let task_exec = TaskExecution::start(execution_db_id, task);
            let task_exec_id = match store.insert_task_execution(&task_exec) {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!(task = %task.name, error = %err, "failed to insert task execution record");
                    None
                }
            };

            info!(dag = %dag.name, task = %task.name, task_id = task.id, "executing task");
            log_status(store, task, dag.id, execution_db_id, "STARTED", &task.execution);

            let code = launcher.run(&task.execution).await;

            if code == 0 {
                queue.mark_completed(task.id);
                if let Some(id) = task_exec_id {
                    record_task_status(store, id, ExecutionStatus::Success, None);
                }
                log_status(
                    store,
                    task,
                    dag.id,
                    execution_db_id,
                    "COMPLETED",
                    "Task completed successfully",
                );
                succeeded += 1;
                info!(dag = %dag.name, task = %task.name, "task completed successfully");
            } else {
                // No mark_completed: dependents of a failed task must never
                // become ready.
                let message = format!("task exited with code {code}");
                if let Some(id) = task_exec_id {
                    record_task_status(store, id, ExecutionStatus::Failed, Some(&message));
                }
                log_status(store, task, dag.id, execution_db_id, "FAILED", &message);
                failed += 1;
                warn!(dag = %dag.name, task = %task.name, exit_code = code, "task failed");
            }
        }

        if failed > 0 {
            warn!(dag = %dag.name, failed, "aborting DAG run after failed wave");
            break;
        }

        if succeeded + failed < total_tasks {
            tokio::time::sleep(options.wave_retry_delay).await;
        }
    }

    let final_status = if failed > 0 || deadlocked {
        ExecutionStatus::Failed
    } else {
        ExecutionStatus::Success
    };
    let summary = format!("DAG execution completed: {succeeded} successful, {failed} failed");
    let error_message = (final_status == ExecutionStatus::Failed).then_some(summary.as_str());

    if let Err(err) = store.update_execution_status(execution_db_id, final_status, error_message) {
        warn!(dag = %dag.name, error = %err, "failed to persist final execution status");
    }

    info!(
        dag = %dag.name,
        execution_id = %execution.execution_id,
        status = final_status.as_str(),
        succeeded,
        failed,
        "DAG execution completed"
    );

    Ok(RunReport {
        execution_id: execution.execution_id,
        status: final_status,
        succeeded,
        failed,
    })
}

fn record_task_status(
    store: &dyn Store,
    task_execution_db_id: i64,
    status: ExecutionStatus,
    error_message: Option<&str>,
) {
    if let Err(err) =
        store.update_task_execution_status(task_execution_db_id, status, error_message)
    {
        warn!(
            task_execution_db_id,
            error = %err,
            "failed to persist task execution status"
        );
    }
}

fn log_status(
    store: &dyn Store,
    task: &crate::dag::model::DagTask,
    dag_id: i64,
    execution_db_id: i64,
    phase: &str,
    details: &str,
) {
    if let Err(err) = store.log_task_status(task.id, dag_id, execution_db_id, phase, details) {
        warn!(task = %task.name, error = %err, "failed to append task status log");
    }
}

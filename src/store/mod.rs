// src/store/mod.rs

//! Persistence layer.
//!
//! The engine talks to the [`Store`] trait instead of a concrete database.
//! This keeps the orchestration core free of storage details and makes it
//! easy to drive the executor with an in-memory fake in tests.
//!
//! [`sqlite::SqliteStore`] is the production implementation.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::dag::model::{Dag, DagExecution, DagTask, ExecutionStatus, TaskExecution};
use crate::errors::Result;

/// Narrow persistence contract consumed by the scheduler and executor.
///
/// Implementations must be safe for concurrent use by multiple simultaneous
/// DAG runs; the core never assumes exclusive access.
pub trait Store: Send + Sync {
    /// Load all DAGs with their tasks and dependency edges.
    fn load_active_dags(&self) -> Result<Vec<Dag>>;

    /// Insert a DAG row (without its tasks); returns the new row id.
    fn insert_dag(&self, dag: &Dag) -> Result<i64>;

    /// Insert a task row together with its dependency edges; returns the
    /// task's row id. A non-zero `task.id` is preserved as the row id so
    /// dependency edges can reference ids chosen up front.
    fn insert_task(&self, task: &DagTask) -> Result<i64>;

    /// Insert a run record; returns the new row id.
    fn insert_execution(&self, execution: &DagExecution) -> Result<i64>;

    /// Insert a task-attempt record; returns the new row id.
    fn insert_task_execution(&self, execution: &TaskExecution) -> Result<i64>;

    /// Move a run record to a (usually terminal) status. Terminal statuses
    /// also stamp the completion time.
    fn update_execution_status(
        &self,
        execution_db_id: i64,
        status: ExecutionStatus,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// Move a task-attempt record to a (usually terminal) status.
    fn update_task_execution_status(
        &self,
        task_execution_db_id: i64,
        status: ExecutionStatus,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// Delete a DAG by id, cascading to its tasks and execution history.
    /// Returns false if no such DAG existed.
    fn delete_dag(&self, dag_id: i64) -> Result<bool>;

    /// Fire-and-forget observability hook: append one row to the task
    /// status audit log. Not required for correctness.
    fn log_task_status(
        &self,
        task_id: i64,
        dag_id: i64,
        dag_execution_id: i64,
        phase: &str,
        details: &str,
    ) -> Result<()>;
}

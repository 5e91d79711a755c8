// src/dag/model.rs

use chrono::{DateTime, Utc};

use crate::errors::{ConduitError, Result};

/// Default cap on dependency edges per task. Configurable via
/// `[tasks].max_dependencies`.
pub const DEFAULT_MAX_DEPENDENCIES: usize = 32;

/// Lifecycle status of a DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DagStatus {
    Active,
    Inactive,
    Paused,
}

impl DagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DagStatus::Active => "active",
            DagStatus::Inactive => "inactive",
            DagStatus::Paused => "paused",
        }
    }

    /// Parse a stored status string. Unknown values fall back to `Active`.
    pub fn parse(s: &str) -> Self {
        match s {
            "inactive" => DagStatus::Inactive,
            "paused" => DagStatus::Paused,
            _ => DagStatus::Active,
        }
    }
}

/// Status of a DAG run or a task attempt within one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
    Skipped,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
            ExecutionStatus::Skipped => "skipped",
        }
    }

    /// Parse a stored status string. Unknown values fall back to `Pending`.
    pub fn parse(s: &str) -> Self {
        match s {
            "running" => ExecutionStatus::Running,
            "success" => ExecutionStatus::Success,
            "failed" => ExecutionStatus::Failed,
            "cancelled" => ExecutionStatus::Cancelled,
            "skipped" => ExecutionStatus::Skipped,
            _ => ExecutionStatus::Pending,
        }
    }
}

/// A dependency edge: this task waits on `task_id`.
///
/// `task_name` is denormalised for diagnostics only; the id is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDependency {
    pub task_id: i64,
    pub task_name: String,
}

/// A unit of work inside a DAG, mapped to an external process invocation.
#[derive(Debug, Clone)]
pub struct DagTask {
    pub id: i64,
    pub dag_id: i64,
    pub name: String,
    /// Execution directive resolved by the launcher, a relative path under
    /// the configured `dags/` directory.
    pub execution: String,
    pub dependencies: Vec<TaskDependency>,
}

impl DagTask {
    pub fn new(id: i64, dag_id: i64, name: impl Into<String>, execution: impl Into<String>) -> Self {
        Self {
            id,
            dag_id,
            name: name.into(),
            execution: execution.into(),
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency edge on another task in the same DAG.
    ///
    /// Fails with `CapacityExceeded` once `limit` edges are held, and
    /// rejects self-dependencies and duplicate edges; the execution queue
    /// counts completions per edge, so duplicates are a construction-time
    /// error rather than something the queue special-cases.
    pub fn add_dependency(
        &mut self,
        dependency_task_id: i64,
        dependency_task_name: impl Into<String>,
        limit: usize,
    ) -> Result<()> {
        if self.dependencies.len() >= limit {
            return Err(ConduitError::CapacityExceeded {
                task: self.name.clone(),
                limit,
            });
        }
        if dependency_task_id == self.id {
            return Err(ConduitError::InvalidDag {
                dag: format!("dag {}", self.dag_id),
                reason: format!("task '{}' cannot depend on itself", self.name),
            });
        }
        if self
            .dependencies
            .iter()
            .any(|d| d.task_id == dependency_task_id)
        {
            return Err(ConduitError::InvalidDag {
                dag: format!("dag {}", self.dag_id),
                reason: format!(
                    "task '{}' already depends on task {}",
                    self.name, dependency_task_id
                ),
            });
        }

        self.dependencies.push(TaskDependency {
            task_id: dependency_task_id,
            task_name: dependency_task_name.into(),
        });
        Ok(())
    }
}

/// A named workflow: tasks connected by dependency edges, triggered by a
/// cron expression.
#[derive(Debug, Clone)]
pub struct Dag {
    pub id: i64,
    pub name: String,
    pub cron_expression: String,
    pub description: String,
    pub status: DagStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tasks: Vec<DagTask>,
}

impl Dag {
    /// Create a new active DAG with both timestamps stamped to now.
    pub fn new(
        name: impl Into<String>,
        cron_expression: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            cron_expression: cron_expression.into(),
            description: description.into(),
            status: DagStatus::Active,
            created_at: now,
            updated_at: now,
            tasks: Vec::new(),
        }
    }

    /// Add a task, enforcing id uniqueness within the DAG.
    pub fn add_task(&mut self, task: DagTask) -> Result<()> {
        if self.tasks.iter().any(|t| t.id == task.id) {
            return Err(ConduitError::InvalidDag {
                dag: self.name.clone(),
                reason: format!("duplicate task id {}", task.id),
            });
        }
        self.tasks.push(task);
        Ok(())
    }

    pub fn task_by_id(&self, id: i64) -> Option<&DagTask> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

/// One record per triggered run of a DAG.
#[derive(Debug, Clone)]
pub struct DagExecution {
    /// Database row id, 0 until inserted.
    pub id: i64,
    pub dag_id: i64,
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl DagExecution {
    /// Start a new run record in the `Running` state.
    pub fn start(dag_id: i64) -> Self {
        Self {
            id: 0,
            dag_id,
            execution_id: generate_execution_id(dag_id),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
        }
    }
}

/// One record per task attempt within a [`DagExecution`].
#[derive(Debug, Clone)]
pub struct TaskExecution {
    /// Database row id, 0 until inserted.
    pub id: i64,
    pub dag_execution_id: i64,
    pub task_id: i64,
    pub task_name: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl TaskExecution {
    /// Start a new task attempt record in the `Running` state.
    pub fn start(dag_execution_id: i64, task: &DagTask) -> Self {
        Self {
            id: 0,
            dag_execution_id,
            task_id: task.id,
            task_name: task.name.clone(),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
        }
    }
}

/// Generate a unique id for one triggered run: `dag_<dagId>_<unixTimestamp>`.
pub fn generate_execution_id(dag_id: i64) -> String {
    format!("dag_{}_{}", dag_id, Utc::now().timestamp())
}

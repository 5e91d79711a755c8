// src/dag/mod.rs

//! DAG data model and structural validation.
//!
//! - [`model`] holds the DAG, task and execution-record types.
//! - [`validate`] owns cycle detection and dependency-existence checks.

pub mod model;
pub mod validate;

pub use model::{
    Dag, DagExecution, DagStatus, DagTask, ExecutionStatus, TaskDependency, TaskExecution,
    DEFAULT_MAX_DEPENDENCIES,
};
pub use validate::{has_cycle, validate_dependencies};

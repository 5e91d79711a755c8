// src/engine/mod.rs

//! Orchestration engine for conduit.
//!
//! This module ties together:
//! - the per-run execution queue that turns the dependency graph into
//!   waves of runnable tasks
//! - the executor that drives one DAG run to completion
//! - the long-running scheduler loop that polls cron expressions and
//!   dispatches due DAGs

pub mod executor;
pub mod queue;
pub mod scheduler;

pub use executor::{execute_dag, ExecutorOptions, RunReport};
pub use queue::ExecutionQueue;
pub use scheduler::{ActiveDags, Scheduler, SchedulerOptions};

// src/errors.rs

//! Crate-wide error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConduitError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid cron expression: {0}")]
    InvalidCron(String),

    #[error("Invalid dependencies in DAG '{dag}': {reason}")]
    InvalidDag { dag: String, reason: String },

    #[error("Cycle detected in DAG '{0}'")]
    DagCycle(String),

    #[error("Task '{task}' already has the maximum of {limit} dependencies")]
    CapacityExceeded { task: String, limit: usize },

    #[error("DAG not found: {0}")]
    DagNotFound(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ConduitError>;

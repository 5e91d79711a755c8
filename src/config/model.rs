// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [store]
/// path = "conduit.db"
///
/// [scheduler]
/// poll_interval_secs = 30
/// wave_retry_delay_ms = 100
///
/// [tasks]
/// dags_dir = "dags"
/// max_dependencies = 32
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// SQLite store settings from `[store]`.
    #[serde(default)]
    pub store: StoreSection,

    /// Scheduler loop settings from `[scheduler]`.
    #[serde(default)]
    pub scheduler: SchedulerSection,

    /// Task model settings from `[tasks]`.
    #[serde(default)]
    pub tasks: TasksSection,
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// Path to the SQLite database file.
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "conduit.db".to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// How often the loop re-evaluates cron expressions, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Pause between execution waves inside one DAG run, in milliseconds.
    #[serde(default = "default_wave_retry_delay_ms")]
    pub wave_retry_delay_ms: u64,
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_wave_retry_delay_ms() -> u64 {
    100
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            wave_retry_delay_ms: default_wave_retry_delay_ms(),
        }
    }
}

/// `[tasks]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TasksSection {
    /// Directory (relative to the working directory) where task executables
    /// live. A task's execution directive is resolved under this directory.
    #[serde(default = "default_dags_dir")]
    pub dags_dir: String,

    /// Maximum number of dependency edges a single task may hold.
    ///
    /// Enforced by `DagTask::add_dependency` at construction time; the
    /// engine itself never builds tasks, so this knob is consumed by the
    /// DAG-creation surface (API layer) sitting on top of this crate.
    #[serde(default = "default_max_dependencies")]
    pub max_dependencies: usize,
}

fn default_dags_dir() -> String {
    "dags".to_string()
}

fn default_max_dependencies() -> usize {
    32
}

impl Default for TasksSection {
    fn default() -> Self {
        Self {
            dags_dir: default_dags_dir(),
            max_dependencies: default_max_dependencies(),
        }
    }
}

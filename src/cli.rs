// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `conduit`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "conduit",
    version,
    about = "Cron-driven DAG job orchestrator.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Conduit.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Conduit.toml")]
    pub config: String,

    /// Trigger one DAG by id immediately, print the outcome, and exit
    /// instead of entering the scheduler loop.
    #[arg(long, value_name = "DAG_ID")]
    pub trigger: Option<i64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CONDUIT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate the stored DAGs, print them, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

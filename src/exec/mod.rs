// src/exec/mod.rs

//! Process execution layer.
//!
//! The executor talks to the [`TaskLauncher`] trait instead of spawning
//! processes directly, so tests can script exit codes without touching the
//! OS. [`launcher::ProcessLauncher`] is the production implementation.

pub mod launcher;

pub use launcher::{ProcessLauncher, TaskLauncher};

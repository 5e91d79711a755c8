// src/config/mod.rs

//! Configuration loading and validation for conduit.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).

pub mod loader;
pub mod model;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, SchedulerSection, StoreSection, TasksSection};

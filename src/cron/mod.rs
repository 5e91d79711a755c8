// src/cron/mod.rs

//! Cron expression handling.
//!
//! - [`matcher`] evaluates whether an expression matches a point in time.
//!   Matching is best-effort: malformed tokens simply never match.
//! - [`validate`] is the strict counterpart used at DAG-creation time.

pub mod matcher;
pub mod validate;

pub use matcher::{is_time_to_run, match_cron_field, CronTime, FieldBounds, CRON_FIELD_BOUNDS};
pub use validate::validate_expression;

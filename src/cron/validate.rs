// src/cron/validate.rs

//! Strict cron expression validation.
//!
//! Unlike the matcher, which is best-effort, this enforces the numeric
//! bounds of every literal, list member, range endpoint and step. It runs
//! once at DAG-creation time, not on scheduler ticks.

use crate::cron::matcher::{FieldBounds, CRON_FIELD_BOUNDS};
use crate::errors::{ConduitError, Result};

const FIELD_NAMES: [&str; 5] = ["minute", "hour", "day-of-month", "month", "day-of-week"];

/// Validate a 5-field cron expression.
///
/// Returns an [`ConduitError::InvalidCron`] describing the first offending
/// field.
pub fn validate_expression(expression: &str) -> Result<()> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(ConduitError::InvalidCron(format!(
            "expected 5 fields, got {} in '{}'",
            fields.len(),
            expression
        )));
    }

    for (i, field) in fields.iter().enumerate() {
        validate_field(field, CRON_FIELD_BOUNDS[i]).map_err(|reason| {
            ConduitError::InvalidCron(format!(
                "{} field '{}': {}",
                FIELD_NAMES[i], field, reason
            ))
        })?;
    }

    Ok(())
}

fn validate_field(field: &str, bounds: FieldBounds) -> std::result::Result<(), String> {
    if field == "*" {
        return Ok(());
    }

    for token in field.split(',') {
        validate_token(token, bounds)?;
    }

    Ok(())
}

fn validate_token(token: &str, bounds: FieldBounds) -> std::result::Result<(), String> {
    if let Some((start, end)) = token.split_once('-') {
        let start = parse_in_bounds(start, bounds)?;
        let end = parse_in_bounds(end, bounds)?;
        if start > end {
            return Err(format!("range start {start} is greater than end {end}"));
        }
        return Ok(());
    }

    if let Some((base, step)) = token.split_once('/') {
        let step: i64 = step
            .parse()
            .map_err(|_| format!("step '{step}' is not an integer"))?;
        if step < 1 {
            return Err(format!("step must be >= 1, got {step}"));
        }
        if base != "*" {
            parse_in_bounds(base, bounds)?;
        }
        return Ok(());
    }

    parse_in_bounds(token, bounds)?;
    Ok(())
}

fn parse_in_bounds(s: &str, bounds: FieldBounds) -> std::result::Result<i64, String> {
    let value: i64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not an integer"))?;
    if value < bounds.min || value > bounds.max {
        return Err(format!(
            "{value} is outside the allowed range {}-{}",
            bounds.min, bounds.max
        ));
    }
    Ok(value)
}

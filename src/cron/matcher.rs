// src/cron/matcher.rs

use chrono::{Datelike, Local, Timelike};

/// Inclusive value range for one cron field.
///
/// Matching only uses `min` (as the implicit base of `*/n` steps); the full
/// range is enforced by [`crate::cron::validate`] at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBounds {
    pub min: i64,
    pub max: i64,
}

/// Standard bounds for the five cron fields, in expression order:
/// minute, hour, day-of-month, month, day-of-week (0 = Sunday).
pub const CRON_FIELD_BOUNDS: [FieldBounds; 5] = [
    FieldBounds { min: 0, max: 59 },
    FieldBounds { min: 0, max: 23 },
    FieldBounds { min: 1, max: 31 },
    FieldBounds { min: 1, max: 12 },
    FieldBounds { min: 0, max: 6 },
];

/// The wall-clock fields a cron expression is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronTime {
    pub minute: i64,
    pub hour: i64,
    pub day_of_month: i64,
    pub month: i64,
    /// 0-6, Sunday = 0.
    pub day_of_week: i64,
}

impl CronTime {
    /// Capture the current local time as cron fields.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            minute: i64::from(now.minute()),
            hour: i64::from(now.hour()),
            day_of_month: i64::from(now.day()),
            month: i64::from(now.month()),
            day_of_week: i64::from(now.weekday().num_days_from_sunday()),
        }
    }

    fn fields(&self) -> [i64; 5] {
        [
            self.minute,
            self.hour,
            self.day_of_month,
            self.month,
            self.day_of_week,
        ]
    }
}

/// Evaluate one cron field against a value.
///
/// Grammar, tried per comma-separated alternative with first match winning:
/// - `*` matches everything
/// - `a-b` matches iff `a <= value <= b` (a reversed range never matches)
/// - `*/n` matches iff `n > 0` and `(value - min) % n == 0`
/// - `a/n` matches iff `value >= a` and `(value - a) % n == 0`
/// - bare integer matches on equality
///
/// Tokens that parse as none of these never match; matching is best-effort
/// and never errors.
pub fn match_cron_field(field: &str, value: i64, bounds: FieldBounds) -> bool {
    if field == "*" {
        return true;
    }

    field
        .split(',')
        .any(|token| match_token(token, value, bounds))
}

fn match_token(token: &str, value: i64, bounds: FieldBounds) -> bool {
    if let Some((start, end)) = token.split_once('-') {
        let (Ok(start), Ok(end)) = (start.parse::<i64>(), end.parse::<i64>()) else {
            return false;
        };
        return value >= start && value <= end;
    }

    if let Some((base, step)) = token.split_once('/') {
        let Ok(step) = step.parse::<i64>() else {
            return false;
        };
        if base == "*" {
            return step > 0 && (value - bounds.min) % step == 0;
        }
        let Ok(base) = base.parse::<i64>() else {
            return false;
        };
        return step > 0 && value >= base && (value - base) % step == 0;
    }

    matches!(token.parse::<i64>(), Ok(target) if target == value)
}

/// Returns true if the cron expression matches the given time.
///
/// The expression must have at least 5 whitespace-separated fields; fewer
/// tokens never match. Extra tokens beyond the fifth are ignored.
pub fn is_time_to_run(cron_expression: &str, now: &CronTime) -> bool {
    let fields: Vec<&str> = cron_expression.split_whitespace().collect();
    if fields.len() < 5 {
        return false;
    }

    let values = now.fields();
    (0..5).all(|i| match_cron_field(fields[i], values[i], CRON_FIELD_BOUNDS[i]))
}

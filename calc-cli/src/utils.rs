use std::sync::LazyLock;

use chrono::{DateTime, Local};
use regex::Regex;
use thiserror::Error;

/// `id=value`, where `id` is a lowercase field identifier. The value may be
/// empty and may itself contain `=`.
static OVERRIDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([a-z][a-z0-9_]*)\s*=(.*)$").expect("override pattern is valid")
});

/// Error returned when a `--set` argument is not of the form `id=value`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid override '{0}': expected id=value")]
pub struct ParseOverrideError(String);

/// Splits a `--set id=value` argument into a trimmed id and value. Coercion
/// of the value happens in the input model.
pub fn parse_override(s: &str) -> Result<(String, String), ParseOverrideError> {
    let captures = OVERRIDE_PATTERN
        .captures(s)
        .ok_or_else(|| ParseOverrideError(s.to_string()))?;
    Ok((captures[1].to_string(), captures[2].trim().to_string()))
}

/// Formats an epoch-millisecond timestamp in local time, or `"-"` when it
/// is out of range.
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

//! Interval parsing.

use super::ConfigError;
use std::time::Duration;

/// Parse an interval string like "1h", "30m", "300s" or "300" into a duration.
/// Supports:
/// - Plain numbers (interpreted as seconds): "300"
/// - Seconds suffix: "300s"
/// - Minutes suffix: "5m"
/// - Hours suffix: "1h"
///
/// Zero intervals are rejected: the run loop would spin against both APIs.
pub fn parse_interval(s: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidInterval {
        value: s.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty interval"));
    }

    let (digits, unit_secs) = if let Some(num) = trimmed.strip_suffix('h') {
        (num, 3600)
    } else if let Some(num) = trimmed.strip_suffix('m') {
        (num, 60)
    } else if let Some(num) = trimmed.strip_suffix('s') {
        (num, 1)
    } else {
        (trimmed, 1)
    };

    let count: u64 = digits
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number with an optional h/m/s suffix"))?;
    if count == 0 {
        return Err(invalid("interval must be greater than zero"));
    }

    count
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| invalid("interval too large"))
}

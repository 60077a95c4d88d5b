//! Record-level value types.

use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outgoing destination record fields, keyed by column name.
///
/// Ordered so that logged payloads and test assertions are deterministic.
pub type FieldMap = BTreeMap<String, serde_json::Value>;

/// Destination-assigned record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attachment descriptor for file columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub filename: String,
}

impl Attachment {
    /// Build an attachment whose filename is the last path segment of `url`
    /// with any query string removed, or `file` when that segment is empty.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let last_segment = url.rsplit('/').next().unwrap_or_default();
        let filename = last_segment
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string();
        let filename = if filename.is_empty() {
            "file".to_string()
        } else {
            filename
        };
        Self { url, filename }
    }
}

/// Parse a timestamp into whole epoch seconds.
///
/// Supports:
/// - integers (already epoch seconds)
/// - numeric strings: "1704067200"
/// - form timestamps: "2024-01-01 12:00:00" (interpreted as UTC)
/// - RFC 3339: "2024-01-01T12:00:00Z"
pub fn parse_timestamp(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive).timestamp());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    s.parse::<i64>().ok()
}

//! Error types for destination operations.

use std::sync::OnceLock;
use thiserror::Error;

/// Error types reported by the destination API that mean "this value or
/// option was rejected", as opposed to an authentication, routing or
/// availability problem.
const VALIDATION_ERROR_TYPES: &[&str] = &[
    "INVALID_VALUE_FOR_COLUMN",
    "INVALID_MULTIPLE_CHOICE_OPTIONS",
    "UNKNOWN_FIELD_NAME",
    "INVALID_RECORDS",
    "INVALID_REQUEST_UNKNOWN",
    "INVALID_FIELD_TYPE",
    "INVALID_FIELD_TYPE_OPTIONS_FOR_CREATE",
    "DUPLICATE_OR_EMPTY_FIELD_NAME",
];

/// Errors that can occur while talking to the destination table.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination rejected a specific value, option or field name.
    ///
    /// Always recoverable at the record (or column) level.
    #[error("Validation error {kind} (HTTP {status}): {message}")]
    Validation {
        status: u16,
        kind: String,
        message: String,
        /// Quoted names or values mentioned in the message, e.g. the field
        /// name in `Field "Top 10 Class" cannot accept the provided value`.
        mentioned: Vec<String>,
    },

    /// Non-2xx response that is not a recognized validation error.
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Network, timeout or TLS failure.
    #[error("Transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configured table does not exist in the base.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl SinkError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Names or values quoted in a validation message; empty otherwise.
    pub fn mentioned(&self) -> &[String] {
        match self {
            Self::Validation { mentioned, .. } => mentioned,
            _ => &[],
        }
    }

    /// Classify a non-2xx response.
    ///
    /// HTTP 422 is always a validation error. Other 4xx responses are
    /// validation errors only when the body carries a recognized error type.
    pub fn from_response(status: u16, body: &str) -> Self {
        let (kind, message) = parse_error_body(body);

        let recognized = kind
            .as_deref()
            .is_some_and(|k| VALIDATION_ERROR_TYPES.contains(&k));

        if status == 422 || ((400..500).contains(&status) && recognized) {
            let message = message.unwrap_or_else(|| body.to_string());
            return Self::Validation {
                status,
                kind: kind.unwrap_or_else(|| "UNPROCESSABLE_ENTITY".to_string()),
                mentioned: quoted_mentions(&message),
                message,
            };
        }

        Self::Status {
            status,
            body: body.to_string(),
        }
    }
}

/// Extract `(type, message)` from `{"error": {"type": ..., "message": ...}}`
/// or `{"error": "TYPE"}`.
fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return (None, None);
    };

    match value.get("error") {
        Some(serde_json::Value::String(kind)) => (Some(kind.clone()), None),
        Some(serde_json::Value::Object(err)) => (
            err.get("type").and_then(|t| t.as_str()).map(str::to_string),
            err.get("message").and_then(|m| m.as_str()).map(str::to_string),
        ),
        _ => (None, None),
    }
}

fn quoted_mentions(message: &str) -> Vec<String> {
    static QUOTED: OnceLock<regex::Regex> = OnceLock::new();
    let re = QUOTED.get_or_init(|| regex::Regex::new(r#""+([^"]+)"+"#).expect("valid regex"));

    re.captures_iter(message)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_for_column() {
        let body = r#"{"error":{"type":"INVALID_VALUE_FOR_COLUMN","message":"Field \"Top 10 Class\" cannot accept the provided value"}}"#;
        let err = SinkError::from_response(422, body);
        assert!(err.is_validation());
        assert_eq!(err.mentioned(), &["Top 10 Class".to_string()]);
    }

    #[test]
    fn test_invalid_choice_option_doubled_quotes() {
        let body = r#"{"error":{"type":"INVALID_MULTIPLE_CHOICE_OPTIONS","message":"Insufficient permissions to create new select option \"\"0-2 years\"\""}}"#;
        let err = SinkError::from_response(422, body);
        match &err {
            SinkError::Validation { kind, mentioned, .. } => {
                assert_eq!(kind, "INVALID_MULTIPLE_CHOICE_OPTIONS");
                assert_eq!(mentioned, &vec!["0-2 years".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_field_name_on_400() {
        let body = r#"{"error":{"type":"UNKNOWN_FIELD_NAME","message":"Unknown field name: \"Fax\""}}"#;
        let err = SinkError::from_response(400, body);
        assert!(err.is_validation());
        assert_eq!(err.mentioned(), &["Fax".to_string()]);
    }

    #[test]
    fn test_auth_failure_is_not_validation() {
        let body = r#"{"error":{"type":"AUTHENTICATION_REQUIRED","message":"Authentication required"}}"#;
        let err = SinkError::from_response(401, body);
        assert!(!err.is_validation());
        assert!(err.mentioned().is_empty());
    }

    #[test]
    fn test_not_found_string_error() {
        let err = SinkError::from_response(404, r#"{"error":"NOT_FOUND"}"#);
        assert!(matches!(err, SinkError::Status { status: 404, .. }));
    }

    #[test]
    fn test_unparseable_422_body() {
        let err = SinkError::from_response(422, "bad things");
        match err {
            SinkError::Validation { kind, message, .. } => {
                assert_eq!(kind, "UNPROCESSABLE_ENTITY");
                assert_eq!(message, "bad things");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_server_error_is_status() {
        let err = SinkError::from_response(503, "unavailable");
        assert!(matches!(err, SinkError::Status { status: 503, .. }));
    }
}

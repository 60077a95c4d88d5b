//! Decoded submission answers.
//!
//! Raw answers arrive as loosely shaped JSON whose layout depends on the
//! question control. [`Answer::decode`] picks one decoder per
//! [`AnswerKind`] so that downstream code matches on a closed set of shapes
//! instead of probing JSON.

use crate::types::{AnswerKind, ControlType};
use crate::values::Attachment;
use serde_json::Value;
use std::collections::BTreeMap;

/// Keys that may hold file URLs inside an upload answer object.
const URL_KEYS: &[&str] = &["answer", "prettyFormat", "formatted", "value"];

/// One answer, decoded according to its control.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Missing, null or blank
    Empty,
    /// A single value (lists already collapsed into a comma-joined string)
    Scalar(Value),
    /// Distinct selected options, in submission order
    Choices(Vec<String>),
    /// File URLs, in submission order
    Files(Vec<String>),
    /// Named parts of a composite answer; blank parts are absent
    Composite(BTreeMap<String, String>),
}

impl Answer {
    /// Decode a raw answer object for the given control.
    pub fn decode(control: &ControlType, raw: Option<&Value>) -> Self {
        Self::decode_as(control.answer_kind(), raw)
    }

    /// Decode a raw answer object into an explicit shape.
    ///
    /// Used when configuration overrides the control's natural shape, e.g. a
    /// composite control with no decomposition rule is read as a scalar.
    pub fn decode_as(kind: AnswerKind, raw: Option<&Value>) -> Self {
        let Some(raw) = raw.filter(|v| !v.is_null()) else {
            return Self::Empty;
        };

        match kind {
            AnswerKind::None => Self::Empty,
            AnswerKind::Files => decode_files(raw),
            AnswerKind::Choices => decode_choices(raw),
            AnswerKind::Composite => decode_composite(raw),
            AnswerKind::Scalar => decode_scalar(raw),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Attachment descriptors for a `Files` answer; empty for anything else.
    pub fn attachments(&self) -> Vec<Attachment> {
        match self {
            Self::Files(urls) => urls.iter().map(Attachment::from_url).collect(),
            _ => Vec::new(),
        }
    }
}

fn decode_files(raw: &Value) -> Answer {
    let mut urls = Vec::new();
    extract_urls(raw, &mut urls);

    // `answer` and `prettyFormat` frequently repeat the same link
    let mut distinct: Vec<String> = Vec::with_capacity(urls.len());
    for url in urls {
        if !distinct.contains(&url) {
            distinct.push(url);
        }
    }

    if distinct.is_empty() {
        Answer::Empty
    } else {
        Answer::Files(distinct)
    }
}

/// Collect every `http://` or `https://` token found in `value`.
///
/// Objects are searched under [`URL_KEYS`], lists element by element, and
/// strings are split on commas and newlines.
pub fn extract_urls(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for key in URL_KEYS {
                if let Some(inner) = map.get(*key) {
                    extract_urls(inner, found);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                extract_urls(item, found);
            }
        }
        Value::String(s) => {
            found.extend(
                s.split([',', '\n'])
                    .map(str::trim)
                    .filter(|p| p.starts_with("http://") || p.starts_with("https://"))
                    .map(str::to_string),
            );
        }
        _ => {}
    }
}

fn decode_choices(raw: &Value) -> Answer {
    let source = match raw {
        Value::Object(map) => match map.get("answer") {
            Some(answer @ Value::Array(_)) => answer,
            Some(answer @ Value::String(_)) if !is_blank(answer) => answer,
            _ => map.get("prettyFormat").unwrap_or(&Value::Null),
        },
        other => other,
    };

    // Selections render as "A, B" or "A; B"
    let items: Vec<String> = match source {
        Value::Array(items) => items.iter().filter_map(value_to_text).collect(),
        Value::String(s) => s.split([',', ';']).map(str::to_string).collect(),
        other => value_to_text(other).into_iter().collect(),
    };

    let mut choices: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !choices.iter().any(|c| c == item) {
            choices.push(item.to_string());
        }
    }

    if choices.is_empty() {
        Answer::Empty
    } else {
        Answer::Choices(choices)
    }
}

fn decode_composite(raw: &Value) -> Answer {
    let Some(parts) = raw.get("answer").and_then(Value::as_object) else {
        return Answer::Empty;
    };

    let parts: BTreeMap<String, String> = parts
        .iter()
        .filter_map(|(key, value)| {
            let text = value_to_text(value)?;
            let text = text.trim();
            (!text.is_empty()).then(|| (key.clone(), text.to_string()))
        })
        .collect();

    if parts.is_empty() {
        Answer::Empty
    } else {
        Answer::Composite(parts)
    }
}

fn decode_scalar(raw: &Value) -> Answer {
    let value = match raw {
        Value::Object(map) => map
            .get("prettyFormat")
            .filter(|v| !is_blank(v))
            .or_else(|| map.get("answer"))
            .unwrap_or(&Value::Null),
        other => other,
    };

    match value {
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(value_to_text)
                .filter(|s| !s.trim().is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            if joined.is_empty() {
                Answer::Empty
            } else {
                Answer::Scalar(Value::String(joined))
            }
        }
        v if is_blank(v) => Answer::Empty,
        v => Answer::Scalar(v.clone()),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Render a scalar JSON value as text; `None` for null and nested values.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

//! Value coercion driven by the destination column type.

use crate::mapping::MappingConfig;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};
use sync_core::{value_to_text, Column, ColumnType};

/// Leading-token date formats accepted for `date` columns.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m-%d-%Y", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Naive date-time formats accepted for `dateTime` columns, read as UTC.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

const TRUE_WORDS: &[&str] = &["yes", "true", "1", "checked"];
const FALSE_WORDS: &[&str] = &["no", "false", "0", "unchecked"];

/// A value the destination column cannot hold. The field is dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoercionError {
    #[error("'{0}' is not a number")]
    NotNumeric(String),

    #[error("'{0}' is not a recognized date")]
    InvalidDate(String),

    #[error("'{0}' is not a recognized date and time")]
    InvalidDateTime(String),

    #[error("'{0}' is not a yes/no value")]
    InvalidBoolean(String),

    #[error("{column_type} column cannot hold {value}")]
    Unsupported { column_type: String, value: String },
}

/// Convert `value` into the shape `column` accepts.
pub fn coerce(value: Value, column: &Column, mapping: &MappingConfig) -> Result<Value, CoercionError> {
    let column_type = &column.column_type;

    match column_type {
        t if t.is_numeric() => to_number(value),
        ColumnType::SingleSelect => {
            let first = match value {
                Value::Array(items) => items.into_iter().find_map(|v| value_to_text(&v)),
                other => value_to_text(&other),
            };
            match first {
                Some(text) => Ok(Value::String(mapping.normalize(&column.name, text.trim()).to_string())),
                None => Err(unsupported(column_type, "an empty selection")),
            }
        }
        ColumnType::MultipleSelects => {
            let items: Vec<String> = match &value {
                Value::Array(items) => items.iter().filter_map(value_to_text).collect(),
                Value::String(s) => s.split(',').map(str::to_string).collect(),
                other => value_to_text(other).into_iter().collect(),
            };
            Ok(Value::Array(
                items
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(mapping.normalize(&column.name, s).to_string()))
                    .collect(),
            ))
        }
        ColumnType::Date => {
            let text = text_of(&value);
            parse_date(&text)
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .ok_or(CoercionError::InvalidDate(text))
        }
        ColumnType::DateTime => {
            let text = text_of(&value);
            parse_date_time(&text)
                .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true)))
                .ok_or(CoercionError::InvalidDateTime(text))
        }
        ColumnType::Checkbox => to_bool(value),
        ColumnType::MultipleAttachments => match value {
            list @ Value::Array(_) => Ok(list),
            other => Err(unsupported(column_type, &other.to_string())),
        },
        _ => {
            let text = text_of(&value);
            // Never blank a cell with a value that has no text form
            if text.trim().is_empty() && !value.is_null() {
                return Err(unsupported(column_type, &value.to_string()));
            }
            Ok(Value::String(mapping.normalize(&column.name, &text).to_string()))
        }
    }
}

/// Value written for an empty answer when existing data should be cleared.
pub fn empty_value(column_type: &ColumnType) -> Value {
    match column_type {
        ColumnType::MultipleSelects | ColumnType::MultipleAttachments => Value::Array(vec![]),
        t if t.is_text() => Value::String(String::new()),
        _ => Value::Null,
    }
}

fn unsupported(column_type: &ColumnType, value: &str) -> CoercionError {
    CoercionError::Unsupported {
        column_type: column_type.to_string(),
        value: value.to_string(),
    }
}

/// Text rendering for text-like columns; lists join with `, `.
///
/// Attachment descriptors render as their URL.
fn text_of(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(map) => map.get("url").and_then(value_to_text),
                other => value_to_text(other),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => value_to_text(other).unwrap_or_else(|| other.to_string()),
    }
}

fn to_number(value: Value) -> Result<Value, CoercionError> {
    let text = match value {
        Value::Number(_) => return Ok(value),
        other => text_of(&other),
    };
    let trimmed = text.trim();

    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or(CoercionError::NotNumeric(text))
}

fn to_bool(value: Value) -> Result<Value, CoercionError> {
    if value.is_boolean() {
        return Ok(value);
    }

    let text = text_of(&value);
    let word = text.trim().to_lowercase();
    if TRUE_WORDS.contains(&word.as_str()) {
        Ok(Value::Bool(true))
    } else if FALSE_WORDS.contains(&word.as_str()) {
        Ok(Value::Bool(false))
    } else {
        Err(CoercionError::InvalidBoolean(text))
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let token = text.split_whitespace().next()?;
    // RFC 3339 style values carry the date before the `T`
    let token = token.split('T').next()?;

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(token, format).ok())
}

fn parse_date_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

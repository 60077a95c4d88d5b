//! Source form and destination table schema.
//!
//! Source side: [`Question`] (one per form control) and [`Submission`]
//! (one per response). Destination side: [`Column`], [`ColumnSpec`] (a
//! column to be created) and [`TableSchema`].

use crate::types::{ColumnType, ControlType};
use crate::values::parse_timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while interpreting schema data.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Timestamp field could not be interpreted
    #[error("Invalid timestamp for submission {submission}: {value}")]
    InvalidTimestamp { submission: String, value: String },
}

/// Form question definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question identifier (stable key into submission answers)
    #[serde(default, deserialize_with = "string_or_number")]
    pub qid: String,
    /// Semantic (machine) name, e.g. `homeAddress`
    #[serde(default)]
    pub name: String,
    /// Display label shown to respondents
    #[serde(default)]
    pub text: String,
    /// Control type
    #[serde(rename = "type")]
    pub control: ControlType,
    /// Raw `|`-delimited option list for choice controls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    /// Position in the form
    #[serde(default, deserialize_with = "string_or_number")]
    pub order: String,
}

impl Question {
    /// Position in the form; unparseable orders sort last.
    pub fn position(&self) -> u32 {
        self.order.trim().parse().unwrap_or(u32::MAX)
    }

    /// Options declared on the question, in declaration order, blanks removed
    /// and duplicates dropped.
    pub fn option_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        if let Some(raw) = &self.options {
            for label in raw.split('|').map(str::trim).filter(|l| !l.is_empty()) {
                if !labels.iter().any(|existing| existing == label) {
                    labels.push(label.to_string());
                }
            }
        }
        labels
    }
}

/// One form response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
    #[serde(default)]
    pub updated_at: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
    /// Raw answers keyed by question identifier
    #[serde(default, deserialize_with = "map_or_empty")]
    pub answers: HashMap<String, serde_json::Value>,
}

impl Submission {
    /// Update timestamp in whole epoch seconds, falling back to the creation
    /// timestamp when the submission was never edited.
    pub fn effective_timestamp(&self) -> Result<i64, SchemaError> {
        let raw = self
            .updated_at
            .as_ref()
            .filter(|v| is_present(v))
            .or(self.created_at.as_ref().filter(|v| is_present(v)));

        match raw {
            None => Ok(0),
            Some(value) => parse_timestamp(value).ok_or_else(|| SchemaError::InvalidTimestamp {
                submission: self.id.clone(),
                value: value.to_string(),
            }),
        }
    }

    pub fn answer(&self, qid: &str) -> Option<&serde_json::Value> {
        self.answers.get(qid)
    }
}

fn is_present(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.trim().is_empty(),
        serde_json::Value::Number(n) => n.as_i64() != Some(0),
        _ => true,
    }
}

/// Existing destination column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Allowed options for choice columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: None,
            name: name.into(),
            column_type,
            choices: Vec::new(),
        }
    }
}

/// A column the reconciler wants to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            choices: Vec::new(),
        }
    }

    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.choices = choices;
        self
    }

    /// The column this spec creates, as it will appear in the table schema.
    pub fn to_column(&self) -> Column {
        Column {
            id: None,
            name: self.name.clone(),
            column_type: self.column_type.clone(),
            choices: self.choices.clone(),
        }
    }
}

/// Destination table schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(id: impl Into<String>, name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            columns,
        }
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Accept identifiers encoded either as JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Submissions without answers come back as `[]` instead of `{}`.
fn map_or_empty<'de, D>(deserializer: D) -> Result<HashMap<String, serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        serde_json::Value::Array(items) if items.is_empty() => Ok(HashMap::new()),
        serde_json::Value::Null => Ok(HashMap::new()),
        other => Err(D::Error::custom(format!(
            "expected answers object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_deserialize() {
        let q: Question = serde_json::from_value(json!({
            "qid": "7",
            "name": "experience",
            "text": "Years of experience",
            "type": "control_dropdown",
            "order": "4",
            "options": "0-2 Years|3-5 Years| |3-5 Years|> 10 Years"
        }))
        .unwrap();

        assert_eq!(q.qid, "7");
        assert_eq!(q.control, ControlType::Dropdown);
        assert_eq!(q.position(), 4);
        assert_eq!(
            q.option_labels(),
            vec!["0-2 Years", "3-5 Years", "> 10 Years"]
        );
    }

    #[test]
    fn test_question_numeric_ids() {
        let q: Question = serde_json::from_value(json!({
            "qid": 12,
            "type": "control_head",
            "order": 1
        }))
        .unwrap();
        assert_eq!(q.qid, "12");
        assert_eq!(q.order, "1");
        assert!(q.options.is_none());
        assert!(q.option_labels().is_empty());
    }

    #[test]
    fn test_submission_answers_as_empty_array() {
        let s: Submission = serde_json::from_value(json!({
            "id": "5801",
            "created_at": "2024-03-01 10:00:00",
            "answers": []
        }))
        .unwrap();
        assert!(s.answers.is_empty());
    }

    #[test]
    fn test_effective_timestamp_prefers_updated() {
        let s: Submission = serde_json::from_value(json!({
            "id": "1",
            "created_at": "2024-01-01 00:00:00",
            "updated_at": "2024-01-02 00:00:00",
        }))
        .unwrap();
        assert_eq!(s.effective_timestamp().unwrap(), 1_704_153_600);
    }

    #[test]
    fn test_effective_timestamp_falls_back_to_created() {
        let s: Submission = serde_json::from_value(json!({
            "id": "1",
            "created_at": "2024-01-01 00:00:00",
            "updated_at": null,
        }))
        .unwrap();
        assert_eq!(s.effective_timestamp().unwrap(), 1_704_067_200);
    }

    #[test]
    fn test_effective_timestamp_invalid() {
        let s: Submission = serde_json::from_value(json!({
            "id": "9",
            "created_at": "yesterday",
        }))
        .unwrap();
        let err = s.effective_timestamp().unwrap_err();
        assert!(err.to_string().contains("submission 9"));
    }

    #[test]
    fn test_table_schema_lookup() {
        let schema = TableSchema::new(
            "tbl1",
            "Table 1",
            vec![
                Column::new("Submission ID", ColumnType::SingleLineText),
                Column::new("Top 10 Class", ColumnType::Number { precision: 0 }),
            ],
        );
        assert!(schema.contains("Top 10 Class"));
        assert!(!schema.contains("Missing"));
        assert_eq!(schema.column_names(), vec!["Submission ID", "Top 10 Class"]);
    }
}

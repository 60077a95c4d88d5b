//! Submission to destination record mapping.
//!
//! For every question the mapper decodes the raw answer into an
//! [`Answer`], routes it to its column(s) per the [`MappingConfig`], coerces
//! it to the destination column type and finally drops everything the
//! destination schema does not have.

pub mod coerce;

use crate::mapping::{ColumnTarget, EmptyAnswerPolicy, MappingConfig};
use serde_json::Value;
use sync_core::{Answer, AnswerKind, FieldMap, Question, Submission, TableSchema};

pub use coerce::{coerce, empty_value, CoercionError};

/// A field removed from the record because its value could not be coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedField {
    pub column: String,
    pub reason: String,
}

/// The exact field set to upsert for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub submission_id: String,
    /// Always contains the submission identifier under the key column
    pub fields: FieldMap,
    pub dropped: Vec<DroppedField>,
}

pub struct FieldMapper<'a> {
    mapping: &'a MappingConfig,
    questions: &'a [Question],
    schema: &'a TableSchema,
}

impl<'a> FieldMapper<'a> {
    pub fn new(mapping: &'a MappingConfig, questions: &'a [Question], schema: &'a TableSchema) -> Self {
        Self {
            mapping,
            questions,
            schema,
        }
    }

    pub fn map(&self, submission: &Submission) -> MappedRecord {
        let mut record = MappedRecord {
            submission_id: submission.id.clone(),
            fields: FieldMap::new(),
            dropped: Vec::new(),
        };

        for question in self.questions {
            let Some(target) = self.mapping.target(question) else {
                continue;
            };
            let raw = submission.answer(&question.qid);

            match target {
                ColumnTarget::Composite(parts) => {
                    let Answer::Composite(values) = Answer::decode_as(AnswerKind::Composite, raw)
                    else {
                        continue;
                    };
                    for (part, column) in parts {
                        if let Some(value) = values.get(part) {
                            self.put(&mut record, column, Value::String(value.clone()));
                        }
                    }
                }
                ColumnTarget::Single(column) => {
                    // Composite controls without a decomposition rule land whole
                    let kind = match question.control.answer_kind() {
                        AnswerKind::Composite => AnswerKind::Scalar,
                        kind => kind,
                    };
                    match answer_value(Answer::decode_as(kind, raw)) {
                        Some(value) => self.put(&mut record, &column, value),
                        None => self.put_empty(&mut record, &column),
                    }
                }
            }
        }

        self.retain_existing(&mut record.fields);
        record.fields.insert(
            self.mapping.key_column.clone(),
            Value::String(submission.id.clone()),
        );
        record
    }

    fn writable(&self, column: &str) -> bool {
        column != self.mapping.key_column && !self.mapping.is_skipped(column)
    }

    fn put(&self, record: &mut MappedRecord, column: &str, value: Value) {
        if !self.writable(column) {
            return;
        }

        // Unknown columns are filtered out afterwards
        let Some(schema_column) = self.schema.get_column(column) else {
            record.fields.insert(column.to_string(), value);
            return;
        };

        match coerce(value, schema_column, self.mapping) {
            Ok(value) => {
                record.fields.insert(column.to_string(), value);
            }
            Err(e) => {
                tracing::warn!(
                    "Submission {}: dropping field '{column}': {e}",
                    record.submission_id
                );
                record.dropped.push(DroppedField {
                    column: column.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    fn put_empty(&self, record: &mut MappedRecord, column: &str) {
        if self.mapping.empty_answers == EmptyAnswerPolicy::Preserve || !self.writable(column) {
            return;
        }
        if let Some(schema_column) = self.schema.get_column(column) {
            record
                .fields
                .insert(column.to_string(), empty_value(&schema_column.column_type));
        }
    }

    fn retain_existing(&self, fields: &mut FieldMap) {
        let mut missing = Vec::new();
        fields.retain(|name, _| {
            let keep = self.schema.contains(name);
            if !keep {
                missing.push(name.clone());
            }
            keep
        });
        if !missing.is_empty() {
            tracing::debug!("Skipping fields missing from destination: {missing:?}");
        }
    }
}

/// JSON value for a decoded answer; `None` when empty.
fn answer_value(answer: Answer) -> Option<Value> {
    match answer {
        Answer::Empty => None,
        Answer::Scalar(value) => Some(value),
        Answer::Choices(choices) => Some(Value::Array(
            choices.into_iter().map(Value::String).collect(),
        )),
        Answer::Files(_) => serde_json::to_value(answer.attachments()).ok(),
        Answer::Composite(parts) => Some(Value::String(
            parts.into_values().collect::<Vec<_>>().join(" "),
        )),
    }
}

//! In-memory source and sink used by unit and integration tests.
//!
//! Both fakes record every call so tests can assert on exactly which
//! requests a sync pass would have sent.

use airtable_sink::{SinkError, TableSink};
use async_trait::async_trait;
use form_sync_jotform_source::FormSource;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use sync_core::{
    Column, ColumnSpec, ColumnType, ControlType, FieldMap, Question, RecordId, Submission,
    TableSchema,
};

/// Build a question definition.
pub fn question(qid: &str, name: &str, text: &str, control: &str) -> Question {
    Question {
        qid: qid.to_string(),
        name: name.to_string(),
        text: text.to_string(),
        control: ControlType::parse(control),
        options: None,
        order: qid.to_string(),
    }
}

/// Build a submission with a form-style `updated_at` timestamp.
pub fn submission(id: &str, updated_at: &str, answers: Vec<(&str, Value)>) -> Submission {
    Submission {
        id: id.to_string(),
        created_at: Some(Value::String(updated_at.to_string())),
        updated_at: Some(Value::String(updated_at.to_string())),
        status: Some("ACTIVE".to_string()),
        answers: answers
            .into_iter()
            .map(|(qid, answer)| (qid.to_string(), answer))
            .collect(),
    }
}

/// Form source serving fixed questions and a replaceable submission list.
pub struct FakeSource {
    questions: Vec<Question>,
    submissions: Mutex<Vec<Submission>>,
    question_fetches: AtomicUsize,
    page_requests: Mutex<Vec<(usize, usize)>>,
}

impl FakeSource {
    pub fn new(questions: Vec<Question>, submissions: Vec<Submission>) -> Self {
        Self {
            questions,
            submissions: Mutex::new(submissions),
            question_fetches: AtomicUsize::new(0),
            page_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_submissions(&self, submissions: Vec<Submission>) {
        *self.submissions.lock().unwrap() = submissions;
    }

    pub fn question_fetches(&self) -> usize {
        self.question_fetches.load(Ordering::SeqCst)
    }

    /// `(offset, limit)` of every page request so far.
    pub fn page_requests(&self) -> Vec<(usize, usize)> {
        self.page_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormSource for FakeSource {
    async fn fetch_questions(&self) -> anyhow::Result<Vec<Question>> {
        self.question_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.questions.clone())
    }

    async fn fetch_submissions_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> anyhow::Result<Vec<Submission>> {
        self.page_requests.lock().unwrap().push((offset, limit));
        let submissions = self.submissions.lock().unwrap();
        Ok(submissions.iter().skip(offset).take(limit).cloned().collect())
    }
}

/// One request received by [`FakeSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    FetchSchema,
    CreateColumn(ColumnSpec),
    FindRecord { key_column: String, key: String },
    CreateRecord(FieldMap),
    UpdateRecord(RecordId, FieldMap),
}

impl SinkCall {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::CreateColumn(_) | Self::CreateRecord(_) | Self::UpdateRecord(..)
        )
    }
}

#[derive(Default)]
struct SinkState {
    schema: TableSchema,
    records: Vec<(RecordId, FieldMap)>,
    calls: Vec<SinkCall>,
    failing_columns: HashSet<String>,
    unavailable_keys: HashSet<String>,
    unavailable: bool,
}

/// Destination table kept in memory.
///
/// Mimics the destination's validation: unknown column names and
/// non-numeric values for numeric columns are rejected with a validation
/// error naming the field. Updates merge into the stored fields.
#[derive(Default)]
pub struct FakeSink {
    state: Mutex<SinkState>,
}

impl FakeSink {
    pub fn new(columns: Vec<Column>) -> Self {
        let sink = Self::default();
        sink.state.lock().unwrap().schema = TableSchema::new("tblFAKE", "Table 1", columns);
        sink
    }

    /// Column creation for `name` fails with a validation error.
    pub fn fail_column(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_columns
            .insert(name.to_string());
    }

    /// Writes of the record keyed by `key` fail with HTTP 503.
    pub fn fail_writes_for(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .unavailable_keys
            .insert(key.to_string());
    }

    /// Schema reads fail with HTTP 503 while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn write_calls(&self) -> Vec<SinkCall> {
        self.calls().into_iter().filter(SinkCall::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn schema(&self) -> TableSchema {
        self.state.lock().unwrap().schema.clone()
    }

    pub fn records(&self) -> Vec<(RecordId, FieldMap)> {
        self.state.lock().unwrap().records.clone()
    }

    /// Stored fields of the record whose `key_column` equals `key`.
    pub fn record(&self, key_column: &str, key: &str) -> Option<FieldMap> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|(_, fields)| fields.get(key_column) == Some(&Value::String(key.to_string())))
            .map(|(_, fields)| fields.clone())
    }
}

impl SinkState {
    fn check_write(&self, fields: &FieldMap) -> Result<(), SinkError> {
        for (name, value) in fields {
            let Some(column) = self.schema.get_column(name) else {
                return Err(validation(
                    "UNKNOWN_FIELD_NAME",
                    format!("Unknown field name: \"{name}\""),
                    name,
                ));
            };
            if column.column_type.is_numeric() && !(value.is_number() || value.is_null()) {
                return Err(validation(
                    "INVALID_VALUE_FOR_COLUMN",
                    format!("Field \"{name}\" cannot accept the provided value"),
                    name,
                ));
            }
        }

        let unavailable = fields
            .values()
            .filter_map(Value::as_str)
            .any(|v| self.unavailable_keys.contains(v));
        if unavailable {
            return Err(SinkError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn validation(kind: &str, message: String, name: &str) -> SinkError {
    SinkError::Validation {
        status: 422,
        kind: kind.to_string(),
        message,
        mentioned: vec![name.to_string()],
    }
}

#[async_trait]
impl TableSink for FakeSink {
    async fn fetch_schema(&self) -> Result<TableSchema, SinkError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(SinkCall::FetchSchema);
        if state.unavailable {
            return Err(SinkError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }
        Ok(state.schema.clone())
    }

    async fn create_column(&self, spec: &ColumnSpec) -> Result<Column, SinkError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(SinkCall::CreateColumn(spec.clone()));

        if state.failing_columns.contains(&spec.name) || state.schema.contains(&spec.name) {
            return Err(validation(
                "DUPLICATE_OR_EMPTY_FIELD_NAME",
                format!("Field \"{}\" cannot be created", spec.name),
                &spec.name,
            ));
        }

        let mut column = spec.to_column();
        column.id = Some(format!("fld{}", state.schema.columns.len() + 1));
        state.schema.columns.push(column.clone());
        Ok(column)
    }

    async fn find_record(
        &self,
        key_column: &str,
        key: &str,
    ) -> Result<Option<RecordId>, SinkError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(SinkCall::FindRecord {
            key_column: key_column.to_string(),
            key: key.to_string(),
        });

        let wanted = Value::String(key.to_string());
        Ok(state
            .records
            .iter()
            .find(|(_, fields)| fields.get(key_column) == Some(&wanted))
            .map(|(id, _)| id.clone()))
    }

    async fn create_record(&self, fields: &FieldMap) -> Result<RecordId, SinkError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(SinkCall::CreateRecord(fields.clone()));
        state.check_write(fields)?;

        let id = RecordId::new(format!("rec{}", state.records.len() + 1));
        state.records.push((id.clone(), fields.clone()));
        Ok(id)
    }

    async fn update_record(&self, id: &RecordId, fields: &FieldMap) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(SinkCall::UpdateRecord(id.clone(), fields.clone()));
        state.check_write(fields)?;

        match state.records.iter_mut().find(|(rid, _)| rid == id) {
            Some((_, existing)) => {
                existing.extend(fields.clone());
                Ok(())
            }
            None => Err(SinkError::Status {
                status: 404,
                body: format!("Record {id} not found"),
            }),
        }
    }
}

/// Column helper for fake schemas.
pub fn column(name: &str, column_type: ColumnType) -> Column {
    Column::new(name, column_type)
}

/// Index calls by kind, handy for counting.
pub fn count_calls(calls: &[SinkCall]) -> HashMap<&'static str, usize> {
    let mut counts = HashMap::new();
    for call in calls {
        let kind = match call {
            SinkCall::FetchSchema => "fetch_schema",
            SinkCall::CreateColumn(_) => "create_column",
            SinkCall::FindRecord { .. } => "find_record",
            SinkCall::CreateRecord(_) => "create_record",
            SinkCall::UpdateRecord(..) => "update_record",
        };
        *counts.entry(kind).or_insert(0) += 1;
    }
    counts
}

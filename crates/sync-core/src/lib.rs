//! Core types for the form-sync framework.
//!
//! This crate provides the foundational types shared by the source client,
//! the destination client and the sync engine:
//!
//! - [`Question`] / [`ControlType`] - form question definitions
//! - [`Submission`] - one form response with its raw answers
//! - [`Answer`] - a raw answer decoded by control kind
//! - [`Column`] / [`ColumnType`] / [`TableSchema`] - destination table schema
//! - [`ColumnSpec`] - a column to be created by schema reconciliation
//! - [`FieldMap`] / [`Attachment`] / [`RecordId`] - outgoing record values
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── form-sync-jotform-source  (deserializes questions/submissions)
//!    ├─── airtable-sink             (reads/writes columns and records)
//!    └─── form-sync                 (reconciler, mapper, orchestrator)
//! ```

pub mod answer;
pub mod schema;
pub mod types;
pub mod values;

pub use answer::{extract_urls, value_to_text, Answer};
pub use schema::{Column, ColumnSpec, Question, SchemaError, Submission, TableSchema};
pub use types::{AnswerKind, ColumnType, ControlType};
pub use values::{parse_timestamp, Attachment, FieldMap, RecordId};

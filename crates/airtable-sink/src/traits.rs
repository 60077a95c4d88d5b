//! TableSink trait definition.

use crate::SinkError;
use sync_core::{Column, ColumnSpec, FieldMap, RecordId, TableSchema};

/// Trait for reading the destination table schema and writing records.
///
/// # Usage Pattern
///
/// The sync engine is generic over the sink:
///
/// ```ignore
/// pub async fn run_sync<S: FormSource, T: TableSink, CS: CheckpointStore>(
///     source: &S,
///     sink: &T,
///     ...
/// ) -> Result<SyncReport> {
///     let existing = sink.find_record("Submission ID", &submission.id).await?;
/// }
/// ```
#[async_trait::async_trait]
pub trait TableSink: Send + Sync {
    /// Fetch the current column set of the destination table.
    async fn fetch_schema(&self) -> Result<TableSchema, SinkError>;

    /// Create one column. Returns the column as created by the destination.
    async fn create_column(&self, spec: &ColumnSpec) -> Result<Column, SinkError>;

    /// Find the record whose `key_column` exactly equals `key`.
    ///
    /// At most one record is returned.
    async fn find_record(&self, key_column: &str, key: &str)
        -> Result<Option<RecordId>, SinkError>;

    /// Create a record with the given fields.
    async fn create_record(&self, fields: &FieldMap) -> Result<RecordId, SinkError>;

    /// Overwrite the given fields of an existing record.
    async fn update_record(&self, id: &RecordId, fields: &FieldMap) -> Result<(), SinkError>;
}

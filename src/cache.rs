//! Per-run cache of the source questions and the destination schema.

use airtable_sink::{SinkError, TableSink};
use anyhow::Context;
use form_sync_jotform_source::FormSource;
use std::sync::Arc;
use sync_core::{Question, TableSchema};

/// Lazily loaded questions and columns.
///
/// Owned by the orchestrator for one run. Questions never change during a
/// run. The column list is invalidated (not patched) whenever columns are
/// created, so the next read reflects what the destination actually holds.
#[derive(Debug, Default)]
pub struct SchemaCache {
    questions: Option<Arc<Vec<Question>>>,
    schema: Option<Arc<TableSchema>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached questions, fetched from `source` on first use.
    pub async fn questions<S: FormSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> anyhow::Result<Arc<Vec<Question>>> {
        if let Some(questions) = &self.questions {
            return Ok(Arc::clone(questions));
        }

        let questions = Arc::new(
            source
                .fetch_questions()
                .await
                .context("Failed to fetch form questions")?,
        );
        self.questions = Some(Arc::clone(&questions));
        Ok(questions)
    }

    /// Cached destination schema, fetched from `sink` on first use or after
    /// invalidation.
    pub async fn schema<K: TableSink + ?Sized>(
        &mut self,
        sink: &K,
    ) -> Result<Arc<TableSchema>, SinkError> {
        if let Some(schema) = &self.schema {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(sink.fetch_schema().await?);
        self.schema = Some(Arc::clone(&schema));
        Ok(schema)
    }

    pub fn invalidate_columns(&mut self) {
        if self.schema.take().is_some() {
            tracing::debug!("Invalidated cached destination columns");
        }
    }

    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{question, FakeSink, FakeSource, SinkCall};
    use sync_core::{ColumnSpec, ColumnType};

    #[tokio::test]
    async fn test_questions_fetched_once() {
        let source = FakeSource::new(vec![question("1", "title", "Title", "control_textbox")], vec![]);
        let mut cache = SchemaCache::new();

        let first = cache.questions(&source).await.unwrap();
        let second = cache.questions(&source).await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.question_fetches(), 1);
    }

    #[tokio::test]
    async fn test_invalidation_refetches_schema() {
        let sink = FakeSink::new(vec![]);
        let mut cache = SchemaCache::new();

        assert!(cache.schema(&sink).await.unwrap().columns.is_empty());
        sink.create_column(&ColumnSpec::new("Title", ColumnType::SingleLineText))
            .await
            .unwrap();

        // Still the stale copy until invalidated
        assert!(cache.schema(&sink).await.unwrap().columns.is_empty());

        cache.invalidate_columns();
        assert!(!cache.has_schema());
        assert!(cache.schema(&sink).await.unwrap().contains("Title"));

        let fetches = sink
            .calls()
            .iter()
            .filter(|c| **c == SinkCall::FetchSchema)
            .count();
        assert_eq!(fetches, 2);
    }
}

//! Schema reconciliation between form questions and destination columns.
//!
//! The reconciler only ever adds columns. Columns the form no longer
//! references are reported as orphans and left in place.

use crate::cache::SchemaCache;
use crate::mapping::{ColumnTarget, MappingConfig};
use airtable_sink::TableSink;
use std::collections::HashSet;
use sync_core::{ColumnSpec, ColumnType, ControlType, Question, TableSchema};

/// Column type for a question control when no override is configured.
pub fn infer_column_type(control: &ControlType) -> ColumnType {
    match control {
        ControlType::Textarea => ColumnType::MultilineText,
        ControlType::Email => ColumnType::Email,
        ControlType::Phone => ColumnType::PhoneNumber,
        ControlType::Number | ControlType::Scale | ControlType::Rating => {
            ColumnType::Number { precision: 0 }
        }
        ControlType::Dropdown | ControlType::Radio => ColumnType::SingleSelect,
        ControlType::Checkbox => ColumnType::MultipleSelects,
        ControlType::FileUpload | ControlType::Signature => ColumnType::MultipleAttachments,
        ControlType::DateTime => ColumnType::Date,
        _ => ColumnType::SingleLineText,
    }
}

/// What reconciliation would change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    /// Missing columns, in form order
    pub to_create: Vec<ColumnSpec>,
    /// Destination columns no question maps to
    pub orphans: Vec<String>,
}

/// A column that could not be created.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFailure {
    pub column: String,
    pub error: String,
}

/// Result of applying a plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileOutcome {
    pub created: Vec<String>,
    pub failures: Vec<ColumnFailure>,
}

pub struct Reconciler<'a> {
    mapping: &'a MappingConfig,
}

impl<'a> Reconciler<'a> {
    pub fn new(mapping: &'a MappingConfig) -> Self {
        Self { mapping }
    }

    /// Every column the form maps to, key column first, then form order.
    ///
    /// Skip-listed columns are included: they are expected (never orphans)
    /// even though they are never created.
    pub fn expected_columns(&self, questions: &[Question]) -> Vec<ColumnSpec> {
        let mut seen = HashSet::new();
        let mut expected = Vec::new();

        let mut push = |spec: ColumnSpec| {
            if seen.insert(spec.name.clone()) {
                expected.push(spec);
            }
        };

        push(ColumnSpec::new(
            self.mapping.key_column.clone(),
            ColumnType::SingleLineText,
        ));

        for question in questions {
            match self.mapping.target(question) {
                None => {}
                Some(ColumnTarget::Single(name)) => push(self.single_spec(question, name)),
                Some(ColumnTarget::Composite(parts)) => {
                    for name in parts.values() {
                        let column_type = self
                            .mapping
                            .column_type(name)
                            .cloned()
                            .unwrap_or(ColumnType::SingleLineText);
                        push(ColumnSpec::new(name.clone(), column_type));
                    }
                }
            }
        }

        expected
    }

    fn single_spec(&self, question: &Question, name: String) -> ColumnSpec {
        let column_type = self
            .mapping
            .column_type(&name)
            .cloned()
            .unwrap_or_else(|| infer_column_type(&question.control));

        let spec = ColumnSpec::new(name, column_type);
        if spec.column_type.is_choice() {
            spec.with_choices(question.option_labels())
        } else {
            spec
        }
    }

    /// Diff the form against the destination schema.
    pub fn plan(&self, questions: &[Question], schema: &TableSchema) -> ReconcilePlan {
        let expected = self.expected_columns(questions);
        let expected_names: HashSet<&str> = expected.iter().map(|s| s.name.as_str()).collect();

        let orphans = schema
            .columns
            .iter()
            .filter(|c| !c.column_type.is_system_managed())
            .filter(|c| c.name != self.mapping.key_column)
            .filter(|c| !expected_names.contains(c.name.as_str()))
            .map(|c| c.name.clone())
            .collect();

        let to_create = expected
            .into_iter()
            .filter(|spec| !schema.contains(&spec.name))
            .filter(|spec| !self.mapping.is_skipped(&spec.name))
            .collect();

        ReconcilePlan { to_create, orphans }
    }

    /// Create every planned column.
    ///
    /// A failure for one column does not stop the others. The column cache
    /// is invalidated if at least one column was created.
    pub async fn create_missing<K: TableSink + ?Sized>(
        &self,
        sink: &K,
        cache: &mut SchemaCache,
        plan: &ReconcilePlan,
    ) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();

        for spec in &plan.to_create {
            match sink.create_column(spec).await {
                Ok(column) => {
                    tracing::info!("Created column '{}' ({})", column.name, column.column_type);
                    outcome.created.push(column.name);
                }
                Err(e) => {
                    tracing::error!("Failed to create column '{}': {e}", spec.name);
                    outcome.failures.push(ColumnFailure {
                        column: spec.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if !outcome.created.is_empty() {
            cache.invalidate_columns();
        }
        outcome
    }
}

/// Log orphaned columns. They are never removed automatically.
pub fn report_orphans(orphans: &[String]) {
    for name in orphans {
        tracing::warn!("Orphaned column '{name}' has no matching form question");
    }
}

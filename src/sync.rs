//! Sync orchestration
//!
//! One pass moves every submission changed since the stored watermark into
//! the destination table:
//!
//! ```text
//! reconcile -> fetch -> filter -> upsert* -> advance watermark
//! ```
//!
//! Processing is strictly sequential and nothing is retried within a pass.
//! Idempotency comes from the key column: each submission maps to at most
//! one destination record, updated in place on later passes.
//!
//! # Watermark
//!
//! A submission is eligible when its update timestamp (falling back to the
//! creation timestamp) is strictly greater than the watermark. After the
//! pass the watermark becomes the maximum timestamp among all eligible
//! submissions, whatever their individual outcome, and is persisted through
//! the [`SyncManager`]. Dry runs never persist it.

use crate::cache::SchemaCache;
use crate::config::Schedule;
use crate::mapper::{FieldMapper, MappedRecord};
use crate::mapping::MappingConfig;
use crate::reconcile::{report_orphans, ColumnFailure, Reconciler};
use airtable_sink::{SinkError, TableSink};
use anyhow::Context;
use checkpoint::{Checkpoint, CheckpointStore, SyncManager};
use form_sync_jotform_source::{fetch_all_submissions, FormSource, JotformCheckpoint};
use serde_json::Value;
use std::time::Duration;
use sync_core::{FieldMap, Submission};

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_WRITE_DELAY: Duration = Duration::from_millis(250);

/// Sync options (non-connection related)
#[derive(Clone, Debug)]
pub struct SyncOpts {
    /// Look up records but never create columns, write records or save the watermark
    pub dry_run: bool,
    /// Treat every submission as eligible
    pub ignore_watermark: bool,
    pub skip_schema_create: bool,
    pub skip_orphan_check: bool,
    pub page_size: usize,
    /// Pause after each successful write
    pub write_delay: Duration,
}

impl Default for SyncOpts {
    fn default() -> Self {
        Self {
            dry_run: false,
            ignore_watermark: false,
            skip_schema_create: false,
            skip_orphan_check: false,
            page_size: DEFAULT_PAGE_SIZE,
            write_delay: DEFAULT_WRITE_DELAY,
        }
    }
}

/// What happened to one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    /// Dry run: the write that would have been issued
    Planned { update: bool },
    /// Rejected by destination validation; offending field names attached
    Skipped { fields: Vec<String> },
    /// Transport failure
    Failed { error: String },
}

/// Summary of one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub fetched: usize,
    pub eligible: usize,
    pub created: usize,
    pub updated: usize,
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Fields removed because their value could not be coerced
    pub fields_dropped: usize,
    pub watermark_before: i64,
    pub watermark_after: i64,
    pub watermark_saved: bool,
    pub columns_created: Vec<String>,
    pub column_failures: Vec<ColumnFailure>,
    pub orphans: Vec<String>,
}

impl SyncReport {
    fn record(&mut self, outcome: &UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Planned { .. } => self.planned += 1,
            UpsertOutcome::Skipped { .. } => self.skipped += 1,
            UpsertOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Run one sync pass.
///
/// # Arguments
/// * `source` - Form to read questions and submissions from
/// * `sink` - Destination table
/// * `mapping` - Static field mapping
/// * `sync_opts` - Sync configuration options
/// * `sync_manager` - Watermark persistence; built with emission disabled for dry runs
///
/// Fails only when the questions, the destination schema or the submissions
/// cannot be read, or the watermark cannot be loaded or saved. Column and
/// record failures are logged and counted in the report.
pub async fn run_sync<F, K, CS>(
    source: &F,
    sink: &K,
    mapping: &MappingConfig,
    sync_opts: &SyncOpts,
    sync_manager: &SyncManager<CS>,
) -> anyhow::Result<SyncReport>
where
    F: FormSource + ?Sized,
    K: TableSink + ?Sized,
    CS: CheckpointStore,
{
    let mut report = SyncReport::default();
    let mut cache = SchemaCache::new();

    let stored: JotformCheckpoint = sync_manager
        .read_checkpoint()
        .await
        .context("Failed to load watermark")?
        .unwrap_or_default();
    report.watermark_before = stored.last_updated_at;
    report.watermark_after = stored.last_updated_at;
    tracing::info!("Loaded watermark: {}", stored.to_cli_string());

    // Setup
    let questions = cache.questions(source).await?;
    let schema = cache
        .schema(sink)
        .await
        .context("Failed to fetch destination schema")?;

    // Reconcile
    let reconciler = Reconciler::new(mapping);
    let plan = reconciler.plan(&questions, &schema);

    if !sync_opts.skip_schema_create && !plan.to_create.is_empty() {
        if sync_opts.dry_run {
            for spec in &plan.to_create {
                tracing::info!(
                    "[DRY RUN] Would create column '{}' ({})",
                    spec.name,
                    spec.column_type
                );
            }
        } else {
            let outcome = reconciler.create_missing(sink, &mut cache, &plan).await;
            report.columns_created = outcome.created;
            report.column_failures = outcome.failures;
        }
    }

    if !sync_opts.skip_orphan_check {
        report_orphans(&plan.orphans);
        report.orphans = plan.orphans;
    }

    let schema = cache
        .schema(sink)
        .await
        .context("Failed to refresh destination schema")?;

    // Fetch
    let submissions = fetch_all_submissions(source, sync_opts.page_size).await?;
    report.fetched = submissions.len();
    tracing::info!("Fetched {} submissions", submissions.len());

    // Filter
    let threshold = if sync_opts.ignore_watermark {
        JotformCheckpoint::default()
    } else {
        stored
    };
    let eligible = eligible_submissions(&submissions, threshold);
    report.eligible = eligible.len();
    tracing::info!(
        "{} submissions newer than watermark {}",
        eligible.len(),
        threshold.last_updated_at
    );

    // Upsert
    let mapper = FieldMapper::new(mapping, &questions, &schema);
    let mut newest: Option<i64> = None;

    for (submission, timestamp) in eligible {
        newest = newest.max(Some(timestamp));

        let record = mapper.map(submission);
        report.fields_dropped += record.dropped.len();

        let outcome = upsert(sink, &mapping.key_column, &record, sync_opts.dry_run).await;
        report.record(&outcome);

        if matches!(outcome, UpsertOutcome::Created | UpsertOutcome::Updated)
            && !sync_opts.write_delay.is_zero()
        {
            tokio::time::sleep(sync_opts.write_delay).await;
        }
    }

    // Advance watermark
    if let Some(newest) = newest {
        let advanced = stored.advance(newest);
        report.watermark_after = advanced.last_updated_at;
        if sync_opts.dry_run {
            tracing::info!(
                "[DRY RUN] Would save watermark: {}",
                advanced.to_cli_string()
            );
        } else {
            report.watermark_saved = sync_manager
                .emit_checkpoint(&advanced)
                .await
                .context("Failed to save watermark")?;
        }
    }

    tracing::info!(
        "Sync pass complete: {} created, {} updated, {} skipped, {} failed ({} eligible of {} fetched)",
        report.created,
        report.updated,
        report.skipped,
        report.failed,
        report.eligible,
        report.fetched
    );

    Ok(report)
}

/// Run passes on a schedule.
///
/// With `schedule.once` a single pass runs and its error is returned. Otherwise
/// passes repeat every `schedule.interval`; a failed pass is logged and the
/// loop carries on. The loop ends on Ctrl+C.
pub async fn run_loop<F, K, CS>(
    source: &F,
    sink: &K,
    mapping: &MappingConfig,
    sync_opts: &SyncOpts,
    sync_manager: &SyncManager<CS>,
    schedule: Schedule,
) -> anyhow::Result<()>
where
    F: FormSource + ?Sized,
    K: TableSink + ?Sized,
    CS: CheckpointStore,
{
    if schedule.once {
        run_sync(source, sink, mapping, sync_opts, sync_manager).await?;
        return Ok(());
    }

    loop {
        if let Err(e) = run_sync(source, sink, mapping, sync_opts, sync_manager).await {
            tracing::error!("Sync pass failed: {e:#}");
        }

        tracing::info!("Next pass in {}s", schedule.interval.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(schedule.interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received interrupt signal (Ctrl+C), stopping");
                return Ok(());
            }
        }
    }
}

/// Submissions strictly newer than `watermark`, with their timestamps.
///
/// Unparseable timestamps are logged and read as 0, which keeps the
/// submission out of every pass.
pub fn eligible_submissions(
    submissions: &[Submission],
    watermark: JotformCheckpoint,
) -> Vec<(&Submission, i64)> {
    submissions
        .iter()
        .map(|submission| {
            let timestamp = submission.effective_timestamp().unwrap_or_else(|e| {
                tracing::warn!("{e}; treating as 0");
                0
            });
            (submission, timestamp)
        })
        .filter(|(_, timestamp)| watermark.admits(*timestamp))
        .collect()
}

/// Create or update the destination record for one mapped submission.
pub async fn upsert<K: TableSink + ?Sized>(
    sink: &K,
    key_column: &str,
    record: &MappedRecord,
    dry_run: bool,
) -> UpsertOutcome {
    let id = &record.submission_id;

    let existing = match sink.find_record(key_column, id).await {
        Ok(existing) => existing,
        Err(e) => return failed(id, &record.fields, e),
    };

    if dry_run {
        let action = if existing.is_some() { "update" } else { "create" };
        let names: Vec<&str> = record.fields.keys().map(String::as_str).collect();
        tracing::info!("[DRY RUN] Would {action} record for submission {id}");
        tracing::info!("[DRY RUN] Fields: {names:?}");
        return UpsertOutcome::Planned {
            update: existing.is_some(),
        };
    }

    tracing::debug!("Submission {id} payload: {:?}", record.fields);

    let result = match &existing {
        Some(record_id) => sink
            .update_record(record_id, &record.fields)
            .await
            .map(|()| record_id.clone()),
        None => sink.create_record(&record.fields).await,
    };

    match result {
        Ok(record_id) if existing.is_some() => {
            tracing::info!("Updated record {record_id} for submission {id}");
            UpsertOutcome::Updated
        }
        Ok(record_id) => {
            tracing::info!("Created record {record_id} for submission {id}");
            UpsertOutcome::Created
        }
        Err(e) => failed(id, &record.fields, e),
    }
}

fn failed(id: &str, fields: &FieldMap, error: SinkError) -> UpsertOutcome {
    if error.is_validation() {
        let fields = offending_fields(&error, fields);
        tracing::warn!("Skipping submission {id}: {error} (fields: {fields:?})");
        UpsertOutcome::Skipped { fields }
    } else {
        tracing::error!("Failed to write submission {id}: {error}");
        UpsertOutcome::Failed {
            error: error.to_string(),
        }
    }
}

/// Payload fields a validation error points at.
///
/// A field matches when the error quotes its name, or quotes a value the
/// field carries (e.g. an unknown select option).
pub fn offending_fields(error: &SinkError, fields: &FieldMap) -> Vec<String> {
    let mentioned = error.mentioned();

    fields
        .iter()
        .filter(|(name, value)| {
            mentioned
                .iter()
                .any(|m| m == *name || value_mentions(value, m))
        })
        .map(|(name, _)| name.clone())
        .collect()
}

fn value_mentions(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s == needle,
        Value::Array(items) => items.iter().any(|v| value_mentions(v, needle)),
        _ => false,
    }
}

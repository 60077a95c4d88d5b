//! Form Sync Library
//!
//! Incrementally copies Jotform form submissions into an Airtable table.
//!
//! # Features
//!
//! - Watermark-based incremental sync: only submissions updated since the last pass are written
//! - Idempotent upserts keyed on the submission identifier
//! - Schema reconciliation: missing destination columns are created, orphaned ones reported
//! - Static field mapping loaded from YAML: renames, composite answers, skip lists, value normalization
//!
//! # Crates
//!
//! - `sync_core` - Form and table domain types, answer decoding
//! - `checkpoint` - Watermark persistence
//! - `form_sync_jotform_source` - Jotform REST client
//! - `airtable_sink` - Airtable REST client
//!
//! # CLI Usage
//!
//! ```bash
//! # One pass, then exit
//! form-sync --once --mapping-file config/mapping.yaml
//!
//! # Poll every five minutes
//! form-sync --interval 5m
//!
//! # Show what would be written
//! form-sync --once --dry-run
//! ```

pub mod cache;
pub mod config;
pub mod mapper;
pub mod mapping;
pub mod reconcile;
pub mod sync;
pub mod testing;

pub use cache::SchemaCache;
pub use config::{CliOpts, ConfigError, Schedule, SyncConfig};
pub use mapper::{FieldMapper, MappedRecord};
pub use mapping::{EmptyAnswerPolicy, MappingConfig, MappingError};
pub use reconcile::{ReconcilePlan, Reconciler};
pub use sync::{run_loop, run_sync, SyncOpts, SyncReport, UpsertOutcome};

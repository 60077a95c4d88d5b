//! Sync pass E2E tests
//!
//! Full passes against the in-memory form source and destination table from
//! `form_sync::testing`. No network access is needed.

mod dry_run_lib;
mod field_mapping_lib;
mod schema_reconcile_lib;
mod watermark_lib;

use form_sync::SyncOpts;
use std::time::Duration;

/// Sync options without the pause between writes.
pub fn fast_opts() -> SyncOpts {
    SyncOpts {
        write_delay: Duration::ZERO,
        ..SyncOpts::default()
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("form_sync=debug")
        .try_init()
        .ok();
}

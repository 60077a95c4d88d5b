//! Command-line interface for form-sync
//!
//! # Usage Examples
//!
//! ```bash
//! export JOTFORM_API_KEY=... JOTFORM_FORM_ID=241234567890
//! export AIRTABLE_TOKEN=pat... AIRTABLE_BASE_ID=appXXXXXXXXXXXXXX AIRTABLE_TABLE="Applications"
//!
//! # Single pass
//! form-sync --once --mapping-file config/mapping.yaml
//!
//! # Preview without writing columns, records or the watermark
//! form-sync --once --dry-run
//!
//! # Re-send everything, e.g. after changing the mapping
//! form-sync --once --ignore-watermark
//!
//! # Poll every ten minutes
//! form-sync --interval 10m --watermark-file /var/lib/form-sync/watermark.json
//! ```
//!
//! ## Watermark File
//! `{"checkpoint_type":"jotform","checkpoint_data":"{\"last_updated_at\":1714554000}","created_at":"2024-05-01T13:00:05Z"}`.
//! A bare `{"last_updated_at":1714554000}` file is accepted too.

use airtable_sink::AirtableSink;
use anyhow::Context;
use checkpoint::{FilesystemStore, SyncManager};
use clap::Parser;
use form_sync::{run_loop, CliOpts};
use form_sync_jotform_source::JotformSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = CliOpts::parse().into_config()?;

    tracing::info!(
        "Syncing form {} into {}/{}",
        config.source.form_id,
        config.sink.base_id,
        config.sink.table
    );
    if config.sync.dry_run {
        tracing::info!("Dry run: nothing will be written");
    }

    let source = JotformSource::new(config.source.clone())
        .context("Failed to build Jotform client")?;
    let sink = AirtableSink::new(config.sink.clone()).context("Failed to build Airtable client")?;
    let sync_manager = SyncManager::new(
        FilesystemStore::new(&config.watermark_file),
        !config.sync.dry_run,
    );

    run_loop(
        &source,
        &sink,
        &config.mapping,
        &config.sync,
        &sync_manager,
        config.schedule,
    )
    .await
}

//! Command-line and environment configuration.
//!
//! Every option has an environment fallback so the binary can run from a
//! scheduler with nothing but a `.env`-style environment. [`CliOpts`] holds
//! the raw values; [`CliOpts::into_config`] validates them into a
//! [`SyncConfig`] before any network call is made.

mod duration;

pub use duration::parse_interval;

use crate::mapping::{MappingConfig, MappingError};
use crate::sync::SyncOpts;
use airtable_sink::SinkOpts;
use clap::Parser;
use form_sync_jotform_source::SourceOpts;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration errors. Always fatal, raised before any network call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required config: {}", .0.join(" / "))]
    Missing(Vec<&'static str>),

    #[error("Invalid interval '{value}': {reason}")]
    InvalidInterval { value: String, reason: String },

    #[error("Page size must be greater than zero")]
    ZeroPageSize,

    #[error("Timeout must be greater than zero")]
    ZeroTimeout,

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Jotform connection options
#[derive(Parser, Clone, Debug)]
pub struct JotformArgs {
    /// Jotform API key
    #[arg(long, env = "JOTFORM_API_KEY", hide_env_values = true)]
    pub jotform_api_key: Option<String>,

    /// Form to synchronize
    #[arg(long, env = "JOTFORM_FORM_ID")]
    pub jotform_form_id: Option<String>,

    /// API base URL (enterprise accounts use https://<org>.jotform.com/API)
    #[arg(long, env = "JOTFORM_BASE", default_value = "https://api.jotform.com")]
    pub jotform_base: String,
}

/// Airtable connection options
#[derive(Parser, Clone, Debug)]
pub struct AirtableArgs {
    /// Personal access token
    #[arg(long, env = "AIRTABLE_TOKEN", hide_env_values = true)]
    pub airtable_token: Option<String>,

    /// Base holding the destination table
    #[arg(long, env = "AIRTABLE_BASE_ID")]
    pub airtable_base_id: Option<String>,

    /// Destination table name or id
    #[arg(long, env = "AIRTABLE_TABLE", default_value = "Table 1")]
    pub airtable_table: String,

    /// API root URL
    #[arg(long, env = "AIRTABLE_API_BASE", default_value = "https://api.airtable.com")]
    pub airtable_api_base: String,

    /// Let Airtable coerce values and create missing select options
    #[arg(long, env = "AIRTABLE_TYPECAST")]
    pub typecast: bool,
}

/// Run options
#[derive(Parser, Clone, Debug)]
pub struct RunArgs {
    /// Run a single pass and exit
    #[arg(long, env = "FORM_SYNC_ONCE")]
    pub once: bool,

    /// Look up records but write nothing (no columns, records or watermark)
    #[arg(long, env = "FORM_SYNC_DRY_RUN")]
    pub dry_run: bool,

    /// Process every submission regardless of the stored watermark
    #[arg(long, env = "FORM_SYNC_IGNORE_WATERMARK")]
    pub ignore_watermark: bool,

    /// Never create missing columns
    #[arg(long, env = "FORM_SYNC_SKIP_SCHEMA_CREATE")]
    pub skip_schema_create: bool,

    /// Do not report orphaned columns
    #[arg(long, env = "FORM_SYNC_SKIP_ORPHAN_CHECK")]
    pub skip_orphan_check: bool,

    /// Pause between passes: seconds or a value like "30s", "5m", "1h"
    #[arg(long, env = "FORM_SYNC_INTERVAL", default_value = "300")]
    pub interval: String,

    /// YAML field mapping (defaults apply when omitted)
    #[arg(long, env = "FORM_SYNC_MAPPING_FILE", value_name = "PATH")]
    pub mapping_file: Option<PathBuf>,

    /// Watermark file
    #[arg(long, env = "FORM_SYNC_WATERMARK_FILE", default_value = "watermark.json")]
    pub watermark_file: PathBuf,

    /// Submissions requested per page
    #[arg(long, env = "FORM_SYNC_PAGE_SIZE", default_value = "100")]
    pub page_size: usize,

    /// Pause after each successful record write, in milliseconds
    #[arg(long, env = "FORM_SYNC_WRITE_DELAY_MS", default_value = "250")]
    pub write_delay_ms: u64,

    /// Per-request HTTP timeout, in seconds
    #[arg(long, env = "FORM_SYNC_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,
}

/// All command-line options
#[derive(Parser, Clone, Debug)]
#[command(name = "form-sync")]
#[command(about = "Incrementally sync Jotform submissions into an Airtable table")]
#[command(long_about = None)]
pub struct CliOpts {
    #[command(flatten)]
    pub jotform: JotformArgs,

    #[command(flatten)]
    pub airtable: AirtableArgs,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Pass scheduling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub once: bool,
    pub interval: Duration,
}

/// Validated configuration
#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub source: SourceOpts,
    pub sink: SinkOpts,
    pub sync: SyncOpts,
    pub schedule: Schedule,
    pub mapping: MappingConfig,
    pub watermark_file: PathBuf,
}

fn required(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => v,
        None => {
            missing.push(name);
            String::new()
        }
    }
}

impl CliOpts {
    /// Validate options and load the mapping file.
    pub fn into_config(self) -> Result<SyncConfig, ConfigError> {
        let mut missing = Vec::new();
        let api_key = required(self.jotform.jotform_api_key, "JOTFORM_API_KEY", &mut missing);
        let form_id = required(self.jotform.jotform_form_id, "JOTFORM_FORM_ID", &mut missing);
        let token = required(self.airtable.airtable_token, "AIRTABLE_TOKEN", &mut missing);
        let base_id = required(self.airtable.airtable_base_id, "AIRTABLE_BASE_ID", &mut missing);
        let table = required(Some(self.airtable.airtable_table), "AIRTABLE_TABLE", &mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let run = self.run;
        if run.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if run.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let timeout = Duration::from_secs(run.timeout_secs);
        let schedule = Schedule {
            once: run.once,
            interval: parse_interval(&run.interval)?,
        };

        let mapping = match &run.mapping_file {
            Some(path) => {
                let mapping = MappingConfig::from_file(path)?;
                tracing::info!("Loaded field mapping from {}", path.display());
                mapping
            }
            None => MappingConfig::default(),
        };

        Ok(SyncConfig {
            source: SourceOpts {
                api_key,
                form_id,
                base_url: self.jotform.jotform_base,
                timeout,
            },
            sink: SinkOpts {
                token,
                base_id,
                table,
                api_base: self.airtable.airtable_api_base,
                timeout,
                typecast: self.airtable.typecast,
            },
            sync: SyncOpts {
                dry_run: run.dry_run,
                ignore_watermark: run.ignore_watermark,
                skip_schema_create: run.skip_schema_create,
                skip_orphan_check: run.skip_orphan_check,
                page_size: run.page_size,
                write_delay: Duration::from_millis(run.write_delay_ms),
            },
            schedule,
            mapping,
            watermark_file: run.watermark_file,
        })
    }
}

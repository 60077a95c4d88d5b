//! Jotform source for form-sync
//!
//! This crate fetches form questions and paginated submissions from the
//! Jotform REST API and defines the watermark checkpoint used for
//! incremental runs.

mod client;
pub mod jotform_checkpoint;

pub use client::{fetch_all_submissions, FormSource, JotformSource, SourceOpts};
pub use jotform_checkpoint::JotformCheckpoint;

//! Airtable sink for form-sync.
//!
//! This crate defines the `TableSink` trait the sync engine writes through
//! and `AirtableSink`, its implementation over the Airtable REST and
//! metadata APIs.
//!
//! Errors are classified so callers can recover per record:
//! [`SinkError::Validation`] means the destination rejected a specific value
//! or option, everything else is a transport or protocol failure.

mod client;
mod error;
mod traits;
mod wire;

pub use client::{key_formula, AirtableSink, SinkOpts};
pub use error::SinkError;
pub use traits::TableSink;

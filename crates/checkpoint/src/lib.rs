//! Checkpoint management for form-sync
//!
//! Provides storage-agnostic persistence of the sync watermark: the single
//! scalar that bounds each incremental run to submissions changed since the
//! previous successful run.
//!
//! # Architecture
//!
//! - The `Checkpoint` trait is implemented by source-specific checkpoint
//!   types (e.g. the Jotform `last_updated_at` watermark)
//! - `CheckpointStore` abstracts the storage backend (one durable value,
//!   no history)
//! - `SyncManager` saves/loads checkpoints through a store and honors
//!   dry-run by never emitting
//!
//! ## Storage Backends
//!
//! - `FilesystemStore` - Stores the checkpoint as a single JSON file
//! - `MemoryStore` - Keeps the checkpoint in memory (tests, dry runs)

mod filesystem;
mod manager;
mod memory;
pub mod store;


// Re-export manager types
pub use manager::SyncManager;

// Re-export store trait and types
pub use store::{CheckpointStore, StoredCheckpoint};

// Re-export storage implementations
pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;

/// Trait that source-specific checkpoints must implement.
///
/// # Example
///
/// ```rust
/// use checkpoint::Checkpoint;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct MyWatermark {
///     pub last_updated_at: i64,
/// }
///
/// impl Checkpoint for MyWatermark {
///     const CHECKPOINT_TYPE: &'static str = "my-source";
///
///     fn to_cli_string(&self) -> String {
///         self.last_updated_at.to_string()
///     }
/// }
/// ```
pub trait Checkpoint: serde::Serialize + for<'de> serde::Deserialize<'de> + Clone {
    /// Checkpoint type identifier (e.g., "jotform").
    ///
    /// Stored alongside the serialized checkpoint and validated on load.
    const CHECKPOINT_TYPE: &'static str;

    /// Human-readable form used in log output.
    fn to_cli_string(&self) -> String;
}

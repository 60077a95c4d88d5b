//! Checkpoint storage trait and types
//!
//! This module defines the CheckpointStore trait for backend-agnostic
//! checkpoint storage operations, plus the stored envelope.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Checkpoint data stored in backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCheckpoint {
    /// Serialized checkpoint (e.g., `{"last_updated_at": 1704067200}`)
    pub checkpoint_data: String,
    /// Checkpoint type for validation.
    ///
    /// `None` for files written before the envelope format existed.
    #[serde(default)]
    pub checkpoint_type: Option<String>,
    /// Timestamp when checkpoint was created
    pub created_at: DateTime<Utc>,
}

impl StoredCheckpoint {
    pub fn new(checkpoint_type: &str, checkpoint_data: String) -> Self {
        Self {
            checkpoint_data,
            checkpoint_type: Some(checkpoint_type.to_string()),
            created_at: Utc::now(),
        }
    }
}

/// Trait for checkpoint storage operations.
///
/// A store holds exactly one checkpoint; storing replaces the previous one.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Store a checkpoint in the storage backend, replacing any previous one.
    async fn store_checkpoint(&self, checkpoint: StoredCheckpoint) -> Result<()>;

    /// Read the checkpoint from the storage backend.
    ///
    /// Returns None if no checkpoint has been stored yet.
    async fn read_checkpoint(&self) -> Result<Option<StoredCheckpoint>>;
}

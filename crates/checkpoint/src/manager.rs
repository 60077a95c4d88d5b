//! Generic sync manager for checkpoint operations.

use crate::{store::CheckpointStore, Checkpoint, StoredCheckpoint};

/// Manager for handling sync operations with checkpoint tracking.
///
/// # Example
///
/// ```rust,ignore
/// use checkpoint::{FilesystemStore, SyncManager};
///
/// let manager = SyncManager::new(FilesystemStore::new("watermark.json"), true);
///
/// // Save a checkpoint
/// let checkpoint = JotformCheckpoint { last_updated_at: 1704067200 };
/// manager.emit_checkpoint(&checkpoint).await?;
///
/// // Load a checkpoint
/// let loaded: Option<JotformCheckpoint> = manager.read_checkpoint().await?;
/// ```
pub struct SyncManager<S: CheckpointStore> {
    store: S,
    emit_checkpoints: bool,
}

impl<S: CheckpointStore> SyncManager<S> {
    /// Create a new sync manager.
    ///
    /// # Arguments
    /// * `store` - Storage backend
    /// * `emit_checkpoints` - When `false` (dry runs), `emit_checkpoint` is a no-op
    pub fn new(store: S, emit_checkpoints: bool) -> Self {
        Self {
            store,
            emit_checkpoints,
        }
    }

    /// Get a reference to the storage backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Emit checkpoint for any source-specific checkpoint type.
    ///
    /// This is a **SAVING** operation. Returns `Ok(false)` without touching
    /// the store when emission is disabled.
    pub async fn emit_checkpoint<C: Checkpoint>(&self, checkpoint: &C) -> anyhow::Result<bool> {
        if !self.emit_checkpoints {
            tracing::debug!(
                "Checkpoint emission disabled, not storing {}",
                checkpoint.to_cli_string()
            );
            return Ok(false);
        }

        let checkpoint_data = serde_json::to_string(checkpoint)?;
        self.store
            .store_checkpoint(StoredCheckpoint::new(C::CHECKPOINT_TYPE, checkpoint_data))
            .await?;

        tracing::info!(
            "Emitted {} checkpoint: {}",
            C::CHECKPOINT_TYPE,
            checkpoint.to_cli_string()
        );

        Ok(true)
    }

    /// Read and parse the stored checkpoint into a source-specific type.
    ///
    /// This is a **LOADING** operation. Returns `None` when nothing has been
    /// stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The stored checkpoint type doesn't match `C::CHECKPOINT_TYPE`
    /// - Failed to deserialize checkpoint data
    pub async fn read_checkpoint<C: Checkpoint>(&self) -> anyhow::Result<Option<C>> {
        let Some(stored) = self.store.read_checkpoint().await? else {
            return Ok(None);
        };

        if let Some(found) = stored.checkpoint_type.as_deref() {
            if found != C::CHECKPOINT_TYPE {
                anyhow::bail!(
                    "Checkpoint type mismatch: expected '{}', found '{}'",
                    C::CHECKPOINT_TYPE,
                    found
                );
            }
        }

        let checkpoint: C = serde_json::from_str(&stored.checkpoint_data)?;
        Ok(Some(checkpoint))
    }
}

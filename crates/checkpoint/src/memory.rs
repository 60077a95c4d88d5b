//! In-memory checkpoint storage.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use crate::store::{CheckpointStore, StoredCheckpoint};

/// Keeps the checkpoint in process memory; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<StoredCheckpoint>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `store_checkpoint` calls.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn store_checkpoint(&self, checkpoint: StoredCheckpoint) -> Result<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(checkpoint);
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }

    async fn read_checkpoint(&self) -> Result<Option<StoredCheckpoint>> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

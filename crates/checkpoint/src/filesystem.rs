//! Filesystem-based checkpoint storage implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::store::{CheckpointStore, StoredCheckpoint};

/// Filesystem implementation of CheckpointStore trait.
///
/// Stores the checkpoint as a single JSON file. Writes go to a sibling
/// temporary file that is renamed over the target, so a crash mid-write
/// leaves the previous checkpoint intact.
pub struct FilesystemStore {
    path: PathBuf,
}

impl FilesystemStore {
    /// Create a new FilesystemStore backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CheckpointStore for FilesystemStore {
    async fn store_checkpoint(&self, checkpoint: StoredCheckpoint) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp = self.temp_path();
        std::fs::write(&tmp, serde_json::to_string_pretty(&checkpoint)?)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        tracing::info!("Stored checkpoint to {}", self.path.display());
        Ok(())
    }

    async fn read_checkpoint(&self) -> Result<Option<StoredCheckpoint>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        if let Ok(stored) = serde_json::from_str::<StoredCheckpoint>(&content) {
            return Ok(Some(stored));
        }

        // Bare checkpoint written without the envelope
        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Invalid checkpoint file {}", self.path.display()))?;
        if !value.is_object() {
            anyhow::bail!(
                "Invalid checkpoint file {}: expected a JSON object",
                self.path.display()
            );
        }

        let modified: DateTime<Utc> = std::fs::metadata(&self.path)?.modified()?.into();
        Ok(Some(StoredCheckpoint {
            checkpoint_data: value.to_string(),
            checkpoint_type: None,
            created_at: modified,
        }))
    }
}

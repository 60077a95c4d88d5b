//! Jotform watermark checkpoint
//!
//! The watermark is the maximum "updated" timestamp (whole epoch seconds)
//! among all submissions synchronized so far. A submission is eligible for
//! the next run only if its timestamp is strictly greater.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Jotform-specific checkpoint containing the submission watermark
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct JotformCheckpoint {
    /// Epoch seconds of the newest synchronized submission
    pub last_updated_at: i64,
}

impl JotformCheckpoint {
    pub fn new(last_updated_at: i64) -> Self {
        Self { last_updated_at }
    }

    /// Whether a submission with this timestamp still needs to be synchronized.
    pub fn admits(&self, timestamp: i64) -> bool {
        timestamp > self.last_updated_at
    }

    /// The later of two watermarks; watermarks never move backwards.
    pub fn advance(self, timestamp: i64) -> Self {
        Self {
            last_updated_at: self.last_updated_at.max(timestamp),
        }
    }
}

impl checkpoint::Checkpoint for JotformCheckpoint {
    const CHECKPOINT_TYPE: &'static str = "jotform";

    fn to_cli_string(&self) -> String {
        match DateTime::<Utc>::from_timestamp(self.last_updated_at, 0) {
            Some(dt) => format!("{} ({})", self.last_updated_at, dt.to_rfc3339()),
            None => self.last_updated_at.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkpoint::{Checkpoint, FilesystemStore, SyncManager};
    use tempfile::TempDir;

    #[test]
    fn test_admits_is_strict() {
        let wm = JotformCheckpoint::new(100);
        assert!(!wm.admits(99));
        assert!(!wm.admits(100));
        assert!(wm.admits(101));
    }

    #[test]
    fn test_advance_is_monotonic() {
        let wm = JotformCheckpoint::new(100);
        assert_eq!(wm.advance(50).last_updated_at, 100);
        assert_eq!(wm.advance(150).last_updated_at, 150);
    }

    #[test]
    fn test_cli_string() {
        let wm = JotformCheckpoint::new(1_704_067_200);
        assert_eq!(wm.to_cli_string(), "1704067200 (2024-01-01T00:00:00+00:00)");
    }

    #[test]
    fn test_checkpoint_type() {
        assert_eq!(JotformCheckpoint::CHECKPOINT_TYPE, "jotform");
    }

    #[tokio::test]
    async fn test_jotform_checkpoint_save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let manager = SyncManager::new(FilesystemStore::new(tmp.path().join("watermark.json")), true);

        let original = JotformCheckpoint::new(1_710_000_000);
        manager.emit_checkpoint(&original).await.unwrap();

        let loaded: JotformCheckpoint = manager.read_checkpoint().await.unwrap().unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(JotformCheckpoint::new(7)).unwrap();
        assert_eq!(json, serde_json::json!({"last_updated_at": 7}));
    }
}

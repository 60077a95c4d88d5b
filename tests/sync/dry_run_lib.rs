//! Dry runs read everything and write nothing.

use crate::{fast_opts, init_tracing};
use checkpoint::{FilesystemStore, SyncManager};
use form_sync::testing::{column, question, submission, FakeSink, FakeSource, SinkCall};
use form_sync::{run_sync, MappingConfig, SyncOpts};
use serde_json::json;
use sync_core::ColumnType;

#[tokio::test]
async fn test_dry_run_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("watermark.json");

    let source = FakeSource::new(
        vec![
            question("3", "fullName", "Full Name", "control_textbox"),
            question("4", "bio", "Bio", "control_textarea"),
        ],
        vec![
            submission("1", "2024-05-01 09:00:00", vec![("3", json!({"answer": "Ada"}))]),
            submission("2", "2024-05-02 09:00:00", vec![("3", json!({"answer": "Grace"}))]),
        ],
    );
    let sink = FakeSink::new(vec![
        column("Submission ID", ColumnType::SingleLineText),
        column("Full Name", ColumnType::SingleLineText),
    ]);
    let opts = SyncOpts {
        dry_run: true,
        ..fast_opts()
    };
    // Emission disabled, as the binary builds it for dry runs
    let manager = SyncManager::new(FilesystemStore::new(&path), false);

    let report = run_sync(&source, &sink, &MappingConfig::default(), &opts, &manager).await?;

    assert_eq!(report.planned, 2);
    assert_eq!(report.created + report.updated, 0);
    assert!(report.columns_created.is_empty());
    assert_eq!(report.watermark_after, 1_714_640_400);
    assert!(!report.watermark_saved);

    assert!(sink.write_calls().is_empty());
    assert!(sink.schema().get_column("Bio").is_none());
    assert!(!path.exists());

    let lookups = sink
        .calls()
        .into_iter()
        .filter(|c| matches!(c, SinkCall::FindRecord { .. }))
        .count();
    assert_eq!(lookups, 2);
    Ok(())
}

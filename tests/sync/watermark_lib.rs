//! Watermark filtering and idempotent upserts across passes.

use crate::{fast_opts, init_tracing};
use checkpoint::{FilesystemStore, MemoryStore, SyncManager};
use form_sync::testing::{column, count_calls, question, submission, FakeSink, FakeSource, SinkCall};
use form_sync::{run_sync, MappingConfig};
use form_sync_jotform_source::JotformCheckpoint;
use serde_json::json;
use sync_core::ColumnType;

fn form() -> FakeSource {
    FakeSource::new(
        vec![question("3", "fullName", "Full Name", "control_textbox")],
        vec![
            submission("5801", "2024-05-01 09:00:00", vec![("3", json!({"answer": "Ada"}))]),
            submission("5802", "2024-05-02 09:00:00", vec![("3", json!({"answer": "Grace"}))]),
        ],
    )
}

fn table() -> FakeSink {
    FakeSink::new(vec![
        column("Submission ID", ColumnType::SingleLineText),
        column("Full Name", ColumnType::SingleLineText),
    ])
}

#[tokio::test]
async fn test_nothing_written_at_or_below_watermark() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let (source, sink) = (form(), table());
    let manager = SyncManager::new(MemoryStore::new(), true);
    // Watermark equals the newest submission
    manager
        .emit_checkpoint(&JotformCheckpoint::new(1_714_640_400))
        .await?;

    let report = run_sync(&source, &sink, &MappingConfig::default(), &fast_opts(), &manager).await?;

    assert_eq!(report.fetched, 2);
    assert_eq!(report.eligible, 0);
    assert!(sink.write_calls().is_empty());
    assert_eq!(report.watermark_after, 1_714_640_400);
    assert!(!report.watermark_saved);
    Ok(())
}

#[tokio::test]
async fn test_second_pass_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let (source, sink) = (form(), table());
    let manager = SyncManager::new(MemoryStore::new(), true);
    let mapping = MappingConfig::default();
    let opts = form_sync::SyncOpts {
        ignore_watermark: true,
        ..fast_opts()
    };

    let first = run_sync(&source, &sink, &mapping, &opts, &manager).await?;
    assert_eq!(first.created, 2);

    sink.clear_calls();
    let second = run_sync(&source, &sink, &mapping, &opts, &manager).await?;
    assert_eq!((second.created, second.updated), (0, 2));

    // One record per submission, unchanged content
    assert_eq!(sink.records().len(), 2);
    assert_eq!(sink.record("Submission ID", "5801").unwrap()["Full Name"], json!("Ada"));

    let counts = count_calls(&sink.calls());
    assert_eq!(counts.get("create_record"), None);
    assert_eq!(counts["update_record"], 2);
    assert_eq!(counts["find_record"], 2);
    Ok(())
}

#[tokio::test]
async fn test_edited_submission_updates_in_place() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let (source, sink) = (form(), table());
    let manager = SyncManager::new(MemoryStore::new(), true);
    let mapping = MappingConfig::default();

    run_sync(&source, &sink, &mapping, &fast_opts(), &manager).await?;

    source.set_submissions(vec![
        submission("5801", "2024-05-03 10:00:00", vec![("3", json!({"answer": "Ada L."}))]),
        submission("5802", "2024-05-02 09:00:00", vec![("3", json!({"answer": "Grace"}))]),
    ]);
    sink.clear_calls();
    let report = run_sync(&source, &sink, &mapping, &fast_opts(), &manager).await?;

    assert_eq!(report.eligible, 1);
    assert_eq!(report.updated, 1);
    assert!(matches!(
        sink.write_calls().as_slice(),
        [SinkCall::UpdateRecord(..)]
    ));
    assert_eq!(sink.record("Submission ID", "5801").unwrap()["Full Name"], json!("Ada L."));
    assert_eq!(report.watermark_after, 1_714_730_400);
    Ok(())
}

#[tokio::test]
async fn test_watermark_persists_to_file() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("state").join("watermark.json");
    let (source, sink) = (form(), table());
    let mapping = MappingConfig::default();

    let manager = SyncManager::new(FilesystemStore::new(&path), true);
    let report = run_sync(&source, &sink, &mapping, &fast_opts(), &manager).await?;
    assert!(report.watermark_saved);
    assert!(path.exists());

    // A fresh process reads the saved value back
    let manager = SyncManager::new(FilesystemStore::new(&path), true);
    let stored: Option<JotformCheckpoint> = manager.read_checkpoint().await?;
    assert_eq!(stored, Some(JotformCheckpoint::new(1_714_640_400)));

    sink.clear_calls();
    let report = run_sync(&source, &sink, &mapping, &fast_opts(), &manager).await?;
    assert_eq!(report.watermark_before, 1_714_640_400);
    assert!(sink.write_calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_legacy_watermark_file_is_read() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("watermark.json");
    std::fs::write(&path, r#"{"last_updated_at": 1714554000}"#)?;
    let (source, sink) = (form(), table());

    let manager = SyncManager::new(FilesystemStore::new(&path), true);
    let report = run_sync(&source, &sink, &MappingConfig::default(), &fast_opts(), &manager).await?;

    assert_eq!(report.watermark_before, 1_714_554_000);
    assert_eq!(report.eligible, 1);
    assert!(sink.record("Submission ID", "5801").is_none());
    assert!(sink.record("Submission ID", "5802").is_some());
    Ok(())
}

#[tokio::test]
async fn test_submissions_paged_until_short_page() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let source = FakeSource::new(
        vec![question("3", "fullName", "Full Name", "control_textbox")],
        vec![
            submission("1", "2024-05-01 09:00:00", vec![]),
            submission("2", "2024-05-02 09:00:00", vec![]),
            submission("3", "2024-05-03 09:00:00", vec![]),
        ],
    );
    let sink = table();
    let manager = SyncManager::new(MemoryStore::new(), true);
    let opts = form_sync::SyncOpts {
        page_size: 2,
        ..fast_opts()
    };

    let report = run_sync(&source, &sink, &MappingConfig::default(), &opts, &manager).await?;

    assert_eq!(source.page_requests(), vec![(0, 2), (2, 2)]);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.created, 3);
    Ok(())
}

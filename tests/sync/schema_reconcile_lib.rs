//! Destination columns created or reported by a pass.

use crate::{fast_opts, init_tracing};
use checkpoint::{MemoryStore, SyncManager};
use form_sync::testing::{column, question, submission, FakeSink, FakeSource, SinkCall};
use form_sync::{run_sync, MappingConfig, SyncOpts};
use serde_json::json;
use sync_core::{ColumnSpec, ColumnType, Question};

fn dropdown() -> Question {
    Question {
        options: Some("A|B|C".to_string()),
        ..question("8", "track", "Track", "control_dropdown")
    }
}

#[tokio::test]
async fn test_missing_choice_column_created_with_options() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let source = FakeSource::new(
        vec![dropdown()],
        vec![submission("1", "2024-05-01 09:00:00", vec![("8", json!({"answer": "B"}))])],
    );
    let sink = FakeSink::new(vec![column("Submission ID", ColumnType::SingleLineText)]);
    let manager = SyncManager::new(MemoryStore::new(), true);

    let report = run_sync(&source, &sink, &MappingConfig::default(), &fast_opts(), &manager).await?;

    assert_eq!(report.columns_created, vec!["Track"]);
    let expected = ColumnSpec::new("Track", ColumnType::SingleSelect)
        .with_choices(vec!["A".into(), "B".into(), "C".into()]);
    assert_eq!(sink.calls()[1], SinkCall::CreateColumn(expected));
    assert_eq!(sink.schema().get_column("Track").unwrap().choices, vec!["A", "B", "C"]);

    // The new column is written in the same pass
    assert_eq!(sink.record("Submission ID", "1").unwrap()["Track"], json!("B"));
    Ok(())
}

#[tokio::test]
async fn test_column_failure_does_not_abort_pass() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let source = FakeSource::new(
        vec![dropdown(), question("9", "city", "City", "control_textbox")],
        vec![submission(
            "1",
            "2024-05-01 09:00:00",
            vec![("8", json!({"answer": "A"})), ("9", json!({"answer": "Akron"}))],
        )],
    );
    let sink = FakeSink::new(vec![column("Submission ID", ColumnType::SingleLineText)]);
    sink.fail_column("Track");
    let manager = SyncManager::new(MemoryStore::new(), true);

    let report = run_sync(&source, &sink, &MappingConfig::default(), &fast_opts(), &manager).await?;

    assert_eq!(report.columns_created, vec!["City"]);
    assert_eq!(report.column_failures.len(), 1);
    assert_eq!(report.column_failures[0].column, "Track");
    let record = sink.record("Submission ID", "1").unwrap();
    assert_eq!(record["City"], json!("Akron"));
    assert!(!record.contains_key("Track"));
    Ok(())
}

#[tokio::test]
async fn test_orphans_reported_and_kept() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let source = FakeSource::new(vec![dropdown()], vec![]);
    let sink = FakeSink::new(vec![
        column("Submission ID", ColumnType::SingleLineText),
        column("Track", ColumnType::SingleSelect),
        column("Legacy Notes", ColumnType::MultilineText),
        column("Created", ColumnType::CreatedTime),
    ]);
    let manager = SyncManager::new(MemoryStore::new(), true);

    let report = run_sync(&source, &sink, &MappingConfig::default(), &fast_opts(), &manager).await?;
    assert_eq!(report.orphans, vec!["Legacy Notes"]);
    assert!(sink.write_calls().is_empty());
    assert_eq!(sink.schema().columns.len(), 4);

    let opts = SyncOpts {
        skip_orphan_check: true,
        ..fast_opts()
    };
    let report = run_sync(&source, &sink, &MappingConfig::default(), &opts, &manager).await?;
    assert!(report.orphans.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_skip_schema_create() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let source = FakeSource::new(
        vec![dropdown()],
        vec![submission("1", "2024-05-01 09:00:00", vec![("8", json!({"answer": "C"}))])],
    );
    let sink = FakeSink::new(vec![column("Submission ID", ColumnType::SingleLineText)]);
    let manager = SyncManager::new(MemoryStore::new(), true);
    let opts = SyncOpts {
        skip_schema_create: true,
        ..fast_opts()
    };

    let report = run_sync(&source, &sink, &MappingConfig::default(), &opts, &manager).await?;

    assert!(report.columns_created.is_empty());
    assert!(sink.schema().get_column("Track").is_none());
    // The record is still written without the missing column
    assert_eq!(report.created, 1);
    assert_eq!(sink.record("Submission ID", "1").unwrap().len(), 1);
    Ok(())
}

//! Answer shapes as they land in the destination table.

use crate::{fast_opts, init_tracing};
use checkpoint::{MemoryStore, SyncManager};
use form_sync::testing::{column, question, submission, FakeSink, FakeSource};
use form_sync::{run_sync, MappingConfig};
use serde_json::json;
use sync_core::ColumnType;

const MAPPING: &str = r#"
key_column: Submission ID
field_names:
  resume: Resume
  top10: Top 10 Class
  vocation: Vocation
composite_fields:
  homeAddress:
    city: Home Address (City)
    postal: Home Address (Postal)
column_types:
  Top 10 Class: number
value_normalization:
  Vocation:
    Teacher / Educator: Educator
"#;

fn questions() -> Vec<sync_core::Question> {
    vec![
        question("4", "resume", "Upload your resume", "control_fileupload"),
        question("5", "homeAddress", "Home Address", "control_address"),
        question("6", "top10", "Top 10 class size", "control_textbox"),
        question("7", "vocation", "Vocation", "control_textbox"),
    ]
}

fn table() -> FakeSink {
    FakeSink::new(vec![
        column("Submission ID", ColumnType::SingleLineText),
        column("Resume", ColumnType::MultipleAttachments),
        column("Home Address (City)", ColumnType::SingleLineText),
        column("Home Address (Postal)", ColumnType::SingleLineText),
        column("Top 10 Class", ColumnType::Number { precision: 1 }),
        column("Vocation", ColumnType::SingleSelect),
    ])
}

#[tokio::test]
async fn test_answer_shapes_in_destination() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mapping = MappingConfig::from_yaml(MAPPING)?;
    let source = FakeSource::new(
        questions(),
        vec![submission(
            "5801",
            "2024-05-01 09:00:00",
            vec![
                (
                    "4",
                    json!({"answer": [
                        "https://www.jotform.com/uploads/acme/241/5801/cv.pdf",
                        "https://www.jotform.com/uploads/acme/241/5801/portfolio.zip"
                    ]}),
                ),
                (
                    "5",
                    json!({"answer": {"city": "Cleveland", "postal": "44101", "state": "", "addr_line1": ""}}),
                ),
                ("6", json!({"answer": "12.5"})),
                ("7", json!({"answer": "Teacher / Educator"})),
            ],
        )],
    );
    let sink = table();
    let manager = SyncManager::new(MemoryStore::new(), true);

    let report = run_sync(&source, &sink, &mapping, &fast_opts(), &manager).await?;
    assert_eq!(report.created, 1);
    assert!(report.columns_created.is_empty());

    let record = sink.record("Submission ID", "5801").unwrap();
    assert_eq!(
        record["Resume"],
        json!([
            {"url": "https://www.jotform.com/uploads/acme/241/5801/cv.pdf", "filename": "cv.pdf"},
            {"url": "https://www.jotform.com/uploads/acme/241/5801/portfolio.zip", "filename": "portfolio.zip"}
        ])
    );
    assert_eq!(record["Home Address (City)"], json!("Cleveland"));
    assert_eq!(record["Home Address (Postal)"], json!("44101"));
    assert_eq!(record["Top 10 Class"], json!(12.5));
    assert_eq!(record["Vocation"], json!("Educator"));
    // Only populated parts and the key
    assert_eq!(record.len(), 6);
    Ok(())
}

#[tokio::test]
async fn test_uncoercible_number_is_dropped_not_fatal() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mapping = MappingConfig::from_yaml(MAPPING)?;
    let source = FakeSource::new(
        questions(),
        vec![submission(
            "5802",
            "2024-05-02 09:00:00",
            vec![
                ("6", json!({"answer": "abc"})),
                ("7", json!({"answer": "Nurse"})),
            ],
        )],
    );
    let sink = table();
    let manager = SyncManager::new(MemoryStore::new(), true);

    let report = run_sync(&source, &sink, &mapping, &fast_opts(), &manager).await?;

    assert_eq!((report.created, report.skipped, report.failed), (1, 0, 0));
    assert_eq!(report.fields_dropped, 1);
    let record = sink.record("Submission ID", "5802").unwrap();
    assert!(!record.contains_key("Top 10 Class"));
    assert_eq!(record["Vocation"], json!("Nurse"));
    Ok(())
}

//! Airtable request/response bodies.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sync_core::{Column, ColumnSpec, ColumnType, FieldMap, TableSchema};

#[derive(Debug, Deserialize)]
pub(crate) struct TablesResponse {
    pub tables: Vec<WireTable>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireTable {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<WireField>,
}

impl WireTable {
    pub fn into_schema(self) -> TableSchema {
        TableSchema::new(
            self.id,
            self.name,
            self.fields.into_iter().map(WireField::into_column).collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireField {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: ColumnType,
    #[serde(default)]
    pub options: Option<WireFieldOptions>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireFieldOptions {
    #[serde(default)]
    pub choices: Vec<WireChoice>,
    #[serde(default)]
    pub precision: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireChoice {
    pub name: String,
}

impl WireField {
    pub fn into_column(self) -> Column {
        let options = self.options.unwrap_or_default();
        let column_type = match self.field_type {
            ColumnType::Number { .. } => ColumnType::Number {
                precision: options.precision.unwrap_or(0),
            },
            other => other,
        };
        Column {
            id: self.id,
            name: self.name,
            column_type,
            choices: options.choices.into_iter().map(|c| c.name).collect(),
        }
    }
}

/// Body for `POST /v0/meta/bases/{base}/tables/{table}/fields`.
pub(crate) fn create_field_body(spec: &ColumnSpec) -> serde_json::Value {
    let mut body = json!({
        "name": spec.name,
        "type": spec.column_type.as_str(),
    });
    if let Some(options) = field_options(spec) {
        body["options"] = options;
    }
    body
}

/// Type-specific options the metadata API requires at creation time.
fn field_options(spec: &ColumnSpec) -> Option<serde_json::Value> {
    match &spec.column_type {
        ColumnType::Number { precision } => Some(json!({ "precision": precision })),
        ColumnType::Currency => Some(json!({ "precision": 2, "symbol": "$" })),
        ColumnType::Percent => Some(json!({ "precision": 0 })),
        ColumnType::Rating => Some(json!({ "max": 5, "icon": "star", "color": "yellowBright" })),
        ColumnType::SingleSelect | ColumnType::MultipleSelects => {
            let choices: Vec<WireChoice> = spec
                .choices
                .iter()
                .map(|name| WireChoice { name: name.clone() })
                .collect();
            Some(json!({ "choices": choices }))
        }
        ColumnType::Date => Some(json!({ "dateFormat": { "name": "iso" } })),
        ColumnType::DateTime => Some(json!({
            "dateFormat": { "name": "iso" },
            "timeFormat": { "name": "24hour" },
            "timeZone": "utc",
        })),
        ColumnType::Checkbox => Some(json!({ "icon": "check", "color": "greenBright" })),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RecordBody<'a> {
    pub fields: &'a FieldMap,
    pub typecast: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireRecord {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordsResponse {
    #[serde(default)]
    pub records: Vec<WireRecord>,
}

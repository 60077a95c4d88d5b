//! Airtable REST client.

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use sync_core::{Column, ColumnSpec, FieldMap, RecordId, TableSchema};
use tokio::sync::OnceCell;

use crate::wire::{self, RecordBody, RecordsResponse, TablesResponse, WireField, WireRecord};
use crate::{SinkError, TableSink};

/// Destination connection options (library type without clap)
#[derive(Clone, Debug)]
pub struct SinkOpts {
    pub token: String,
    pub base_id: String,
    /// Table name or table id
    pub table: String,
    /// API root, `https://api.airtable.com` unless testing
    pub api_base: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Let the destination coerce values (and create missing select options)
    pub typecast: bool,
}

/// Airtable implementation of [`TableSink`].
pub struct AirtableSink {
    client: reqwest::Client,
    opts: SinkOpts,
    api_base: Url,
    /// Table id resolved from the metadata API; needed to create columns
    table_id: OnceCell<String>,
}

impl AirtableSink {
    pub fn new(opts: SinkOpts) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(opts.timeout).build()?;
        let api_base = Url::parse(&opts.api_base)
            .map_err(|e| SinkError::Decode(format!("invalid API base {}: {e}", opts.api_base)))?;
        Ok(Self {
            client,
            opts,
            api_base,
            table_id: OnceCell::new(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, SinkError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SinkError::Decode(format!("API base cannot be a base: {}", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn records_url(&self) -> Result<Url, SinkError> {
        self.url(&["v0", &self.opts.base_id, &self.opts.table])
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&(impl serde::Serialize + Sync)>,
    ) -> Result<T, SinkError> {
        tracing::debug!("{method} {}", url.path());

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.opts.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::from_response(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| SinkError::Decode(e.to_string()))
    }

    async fn fetch_table(&self) -> Result<wire::WireTable, SinkError> {
        let url = self.url(&["v0", "meta", "bases", &self.opts.base_id, "tables"])?;
        let response: TablesResponse = self.send(Method::GET, url, None::<&()>).await?;

        response
            .tables
            .into_iter()
            .find(|t| t.name == self.opts.table || t.id == self.opts.table)
            .ok_or_else(|| SinkError::TableNotFound(self.opts.table.clone()))
    }

    async fn table_id(&self) -> Result<&str, SinkError> {
        self.table_id
            .get_or_try_init(|| async { Ok::<_, SinkError>(self.fetch_table().await?.id) })
            .await
            .map(String::as_str)
    }
}

/// Exact-match formula on one column, e.g. `{Submission ID}="5801"`.
pub fn key_formula(column: &str, value: &str) -> String {
    let column = column.replace('}', "\\}");
    let value = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{{{column}}}=\"{value}\"")
}

#[async_trait]
impl TableSink for AirtableSink {
    async fn fetch_schema(&self) -> Result<TableSchema, SinkError> {
        let table = self.fetch_table().await?;
        let _ = self.table_id.set(table.id.clone());

        let schema = table.into_schema();
        tracing::info!(
            "Fetched schema for table '{}' ({} columns)",
            schema.name,
            schema.columns.len()
        );
        Ok(schema)
    }

    async fn create_column(&self, spec: &ColumnSpec) -> Result<Column, SinkError> {
        let table_id = self.table_id().await?.to_string();
        let url = self.url(&[
            "v0",
            "meta",
            "bases",
            &self.opts.base_id,
            "tables",
            &table_id,
            "fields",
        ])?;

        let body = wire::create_field_body(spec);
        let field: WireField = self.send(Method::POST, url, Some(&body)).await?;
        Ok(field.into_column())
    }

    async fn find_record(
        &self,
        key_column: &str,
        key: &str,
    ) -> Result<Option<RecordId>, SinkError> {
        if key.is_empty() {
            return Ok(None);
        }

        let mut url = self.records_url()?;
        url.query_pairs_mut()
            .append_pair("filterByFormula", &key_formula(key_column, key))
            .append_pair("maxRecords", "1");

        let response: RecordsResponse = self.send(Method::GET, url, None::<&()>).await?;
        Ok(response
            .records
            .into_iter()
            .next()
            .map(|r| RecordId::new(r.id)))
    }

    async fn create_record(&self, fields: &FieldMap) -> Result<RecordId, SinkError> {
        let body = RecordBody {
            fields,
            typecast: self.opts.typecast,
        };
        let record: WireRecord = self
            .send(Method::POST, self.records_url()?, Some(&body))
            .await?;
        Ok(RecordId::new(record.id))
    }

    async fn update_record(&self, id: &RecordId, fields: &FieldMap) -> Result<(), SinkError> {
        let mut url = self.records_url()?;
        url.path_segments_mut()
            .map_err(|_| SinkError::Decode("records URL cannot be a base".to_string()))?
            .push(id.as_str());

        let body = RecordBody {
            fields,
            typecast: self.opts.typecast,
        };
        let _: WireRecord = self.send(Method::PATCH, url, Some(&body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formula() {
        assert_eq!(
            key_formula("Submission ID", "5801"),
            "{Submission ID}=\"5801\""
        );
    }

    #[test]
    fn test_key_formula_escapes() {
        assert_eq!(key_formula("Odd}Name", "a\"b\\c"), "{Odd\\}Name}=\"a\\\"b\\\\c\"");
    }

    #[test]
    fn test_records_url_encodes_table_name() {
        let sink = AirtableSink::new(SinkOpts {
            token: "t".into(),
            base_id: "app123".into(),
            table: "Table 1".into(),
            api_base: "https://api.airtable.com".into(),
            timeout: Duration::from_secs(1),
            typecast: false,
        })
        .unwrap();
        assert_eq!(
            sink.records_url().unwrap().as_str(),
            "https://api.airtable.com/v0/app123/Table%201"
        );
    }
}

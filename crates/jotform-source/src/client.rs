//! Jotform REST client

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use sync_core::{Question, Submission};

/// Source connection options (Jotform-specific, library type without clap)
#[derive(Clone, Debug)]
pub struct SourceOpts {
    pub api_key: String,
    pub form_id: String,
    /// API base URL, e.g. `https://api.jotform.com` or an enterprise
    /// `https://<org>.jotform.com/API`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Read-only access to one form's questions and submissions.
#[async_trait]
pub trait FormSource: Send + Sync {
    /// Fetch all question definitions, ordered by their position in the form.
    async fn fetch_questions(&self) -> Result<Vec<Question>>;

    /// Fetch one page of submissions.
    async fn fetch_submissions_page(&self, offset: usize, limit: usize) -> Result<Vec<Submission>>;
}

/// Page through every submission of the form.
///
/// Stops on an empty page or on a page shorter than `page_size`, whichever
/// comes first.
pub async fn fetch_all_submissions<S: FormSource + ?Sized>(
    source: &S,
    page_size: usize,
) -> Result<Vec<Submission>> {
    anyhow::ensure!(page_size > 0, "Page size must be greater than zero");

    let mut submissions = Vec::new();
    let mut offset = 0;

    loop {
        let page = source
            .fetch_submissions_page(offset, page_size)
            .await
            .with_context(|| format!("Failed to fetch submissions at offset {offset}"))?;
        let page_len = page.len();
        tracing::debug!("Fetched {page_len} submissions at offset {offset}");

        if page_len == 0 {
            break;
        }
        submissions.extend(page);
        offset += page_size;

        if page_len < page_size {
            break;
        }
    }

    Ok(submissions)
}

/// Envelope wrapping every Jotform API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(rename = "responseCode", default)]
    response_code: Option<u16>,
    #[serde(default)]
    message: Option<serde_json::Value>,
    content: T,
}

/// HTTP client for the Jotform API
pub struct JotformSource {
    client: reqwest::Client,
    opts: SourceOpts,
}

impl JotformSource {
    pub fn new(opts: SourceOpts) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(opts.timeout)
            .build()
            .context("Failed to build Jotform HTTP client")?;
        Ok(Self { client, opts })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/form/{}/{}",
            self.opts.base_url.trim_end_matches('/'),
            self.opts.form_id,
            path
        )
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.opts.api_key.as_str())])
            .query(params)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Jotform request failed with status {status} for {path}: {body}");
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to decode Jotform response for {path}"))?;

        if let Some(code) = envelope.response_code.filter(|c| !(200..300).contains(c)) {
            anyhow::bail!(
                "Jotform returned response code {code} for {path}: {}",
                envelope.message.unwrap_or_default()
            );
        }

        Ok(envelope.content)
    }
}

#[async_trait]
impl FormSource for JotformSource {
    async fn fetch_questions(&self) -> Result<Vec<Question>> {
        let content: HashMap<String, Question> = self.get("questions", &[]).await?;

        let mut questions: Vec<Question> = content
            .into_iter()
            .map(|(qid, mut question)| {
                if question.qid.is_empty() {
                    question.qid = qid;
                }
                question
            })
            .collect();
        questions.sort_by_key(|q| (q.position(), q.qid.parse::<u32>().unwrap_or(u32::MAX)));

        tracing::info!(
            "Fetched {} questions for form {}",
            questions.len(),
            self.opts.form_id
        );
        Ok(questions)
    }

    async fn fetch_submissions_page(&self, offset: usize, limit: usize) -> Result<Vec<Submission>> {
        self.get(
            "submissions",
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves `total` synthetic submissions and records requested offsets.
    struct PagedSource {
        total: usize,
        offsets: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl FormSource for PagedSource {
        async fn fetch_questions(&self) -> Result<Vec<Question>> {
            Ok(vec![])
        }

        async fn fetch_submissions_page(
            &self,
            offset: usize,
            limit: usize,
        ) -> Result<Vec<Submission>> {
            self.offsets.lock().unwrap().push(offset);
            Ok((offset..self.total.min(offset + limit))
                .map(|i| Submission {
                    id: i.to_string(),
                    created_at: None,
                    updated_at: None,
                    status: None,
                    answers: HashMap::new(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_stops_on_short_page() {
        let source = PagedSource {
            total: 250,
            offsets: Mutex::new(vec![]),
        };
        let all = fetch_all_submissions(&source, 100).await.unwrap();
        assert_eq!(all.len(), 250);
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 100, 200]);
    }

    #[tokio::test]
    async fn test_stops_on_empty_page() {
        let source = PagedSource {
            total: 200,
            offsets: Mutex::new(vec![]),
        };
        let all = fetch_all_submissions(&source, 100).await.unwrap();
        assert_eq!(all.len(), 200);
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 100, 200]);
    }

    #[tokio::test]
    async fn test_zero_page_size_rejected() {
        let source = PagedSource {
            total: 1,
            offsets: Mutex::new(vec![]),
        };
        assert!(fetch_all_submissions(&source, 0).await.is_err());
    }
}

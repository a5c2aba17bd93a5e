// HTTP implementation of the data source port
use crate::application::data_source::DataSource;
use crate::error::FetchError;
use async_trait::async_trait;
use serde_json::Value;

/// Longest upstream error body carried into an error message, in characters.
const MAX_ERROR_DETAIL: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct HttpDataSource {
    client: reqwest::Client,
}

impl HttpDataSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn page_url(base_url: &str, page: u32, limit: u32) -> String {
        let separator = if base_url.contains('?') { '&' } else { '?' };
        format!("{}{}page={}&limit={}", base_url, separator, page, limit)
    }

    fn query_url(base_url: &str, query: &str, page: u32) -> String {
        format!(
            "{}/query?query={}&page={}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(query),
            page
        )
    }

    /// Single attempt; no retry and no timeout beyond the client's own.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                truncate_detail(body.trim())
            };
            return Err(FetchError::status(status, detail));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| FetchError::parse(format!("invalid JSON: {}", e)))
    }
}

fn truncate_detail(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_DETAIL) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_page(&self, base_url: &str, page: u32, limit: u32) -> Result<Value, FetchError> {
        self.get_json(&Self::page_url(base_url, page, limit)).await
    }

    async fn run_query(&self, base_url: &str, query: &str, page: u32) -> Result<Value, FetchError> {
        self.get_json(&Self::query_url(base_url, query, page)).await
    }
}

// Data source trait for the external observation backends
use crate::error::FetchError;
use async_trait::async_trait;
use serde_json::Value;

/// One GET per call, no retry. Implementations return the decoded JSON body;
/// interpreting its shape is left to the backend adapter.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// `GET {base_url}?page={page}&limit={limit}`
    async fn fetch_page(&self, base_url: &str, page: u32, limit: u32) -> Result<Value, FetchError>;

    /// `GET {base_url}/query?query={query}&page={page}`
    async fn run_query(&self, base_url: &str, query: &str, page: u32) -> Result<Value, FetchError>;
}

// Error taxonomy shared by the fetch boundary, the load sessions and the services
use reqwest::StatusCode;

/// Failure of a single page or query request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// Non-success HTTP status, or no response at all (`status` is `None`).
    #[error("{}", network_message(.status, .detail))]
    Network {
        status: Option<StatusCode>,
        detail: String,
    },
    /// Body is not JSON, or not the shape the backend is expected to answer with.
    #[error("unexpected response: {0}")]
    Parse(String),
}

fn network_message(status: &Option<StatusCode>, detail: &str) -> String {
    match status {
        Some(status) => format!("server error {}: {}", status.as_u16(), detail),
        None => format!("network error: {}", detail),
    }
}

impl FetchError {
    pub fn status(status: StatusCode, detail: impl Into<String>) -> Self {
        FetchError::Network {
            status: Some(status),
            detail: detail.into(),
        }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        FetchError::Network {
            status: None,
            detail: detail.into(),
        }
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        FetchError::Parse(detail.into())
    }
}

/// A user action that the current load state does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("a page is already being fetched")]
    Busy,
    #[error("loading has already started; use load more")]
    AlreadyStarted,
    #[error("loading has not started yet")]
    NotStarted,
    #[error("no more pages to load")]
    Exhausted,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("unknown chart: {0}")]
    UnknownChart(String),
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
    #[error("backend {0} is not configured for queries")]
    BackendNotConfigured(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

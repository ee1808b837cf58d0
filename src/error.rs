use thiserror::Error;

/// Failures of the search-index collaborator.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from search index")]
    UnexpectedStatus { status: u16 },

    #[error("search index reported: {0}")]
    Provider(String),

    #[error("invalid search endpoint \"{endpoint}\": {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Failures of a headless browsing session.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("failed to read page content: {0}")]
    Content(String),
}

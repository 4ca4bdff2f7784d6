#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("index '{0}' does not exist")]
    IndexNotFound(String),

    #[error("index '{0}' already exists")]
    IndexAlreadyExists(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store returned status {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("query rejected: {0}")]
    Query(String),

    #[error("{0}")]
    Backend(String),
}

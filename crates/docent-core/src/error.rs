use docent_llm::LlmError;
use docent_store::{BulkItemFailure, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum DocentError {
    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("document is {size} bytes, limit is {limit}")]
    DocumentTooLarge { size: usize, limit: usize },

    #[error("embedding has {actual} dimensions, index expects {expected}")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },

    #[error("{} of {attempted} chunk writes failed", failures.len())]
    StoreWrite {
        attempted: usize,
        failures: Vec<BulkItemFailure>,
    },

    #[error("index '{0}' does not exist")]
    IndexNotFound(String),

    #[error("index '{0}' already exists")]
    IndexAlreadyExists(String),

    #[error("model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("document store error: {0}")]
    Store(StoreError),

    #[error("cannot embed empty text")]
    EmptyInput,
}

impl From<StoreError> for DocentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::IndexNotFound(index) => Self::IndexNotFound(index),
            StoreError::IndexAlreadyExists(index) => Self::IndexAlreadyExists(index),
            other => Self::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DocentError>;

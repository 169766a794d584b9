use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Persisted indexes disagree with each other; a rebuild is required.
    #[error("Inconsistent index state: {0}")]
    Inconsistent(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Re-ranking failed: {0}")]
    Rerank(String),

    #[error("Vector store failure: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True when the caller should rebuild the indexes (`init`) before retrying.
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Inconsistent(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

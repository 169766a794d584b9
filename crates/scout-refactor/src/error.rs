use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RefactorError {
    #[error("API key missing: set {0} (a .env file works too)")]
    MissingApiKey(String),

    #[error("cannot read {path}: {source}")]
    ReadSource { path: PathBuf, source: std::io::Error },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("LLM API returned no choices")]
    EmptyResponse,

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, RefactorError>;

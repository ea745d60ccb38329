use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasskError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Candidate pool is empty")]
    EmptyPool,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, PasskError>;

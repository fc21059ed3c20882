use thiserror::Error;

/// Main error type for Codeatlas operations
#[derive(Error, Debug)]
pub enum CodeAtlasError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extractor error: {0}")]
    Extractor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

pub type Result<T> = std::result::Result<T, CodeAtlasError>;

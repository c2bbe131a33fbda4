use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP error {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Resolution task failed: {0}")]
    Internal(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, MetadataError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown venue: {0}")]
    UnknownVenue(String),

    #[error("No provider registered for type: {0}")]
    UnsupportedProvider(String),

    #[error("Provider error: {message}")]
    Provider { message: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Workflow step not available: {0}")]
    StepBlocked(String),

    #[error("Remote backend error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid structure token: {0}. Expected a positive uid or a known static file path")]
    InvalidToken(String),

    #[error("Malformed static structure entry: {0}")]
    ConfigurationMalformed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Record store error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

//! Error types for Roofscan.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Text extraction unavailable: {0}")]
    ExtractionUnavailable(String),

    #[error("Registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

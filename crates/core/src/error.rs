//! Error types for picshelf-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for picshelf-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for picshelf-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing or contradictory settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Login failed or a request was rejected as unauthenticated
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The store-file call failed
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The directory-refresh call failed
    #[error("Refresh failed: {0}")]
    Refresh(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Network(err.to_string())
        } else if err.is_request() {
            Error::HttpClient(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

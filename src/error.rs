//! Error types for the share count pipeline
//!
//! Each concern gets its own enum. `Error` is what the builders return and what
//! the entry point turns into an `{"error": true, "message": ...}` body, so the
//! `Display` output of every variant is the user-visible message.

use thiserror::Error;

/// Invalid or missing configuration, detected before any fetch happens
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The outbound HTTP call itself failed
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// Errors that can occur while a fetcher retrieves a count
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure reaching the upstream
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Upstream answered with an explicit error payload
    #[error("{0}")]
    Upstream(String),

    /// The upstream request URL could not be built
    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised by the durable cache store
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to move cache entry into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Top-level error surfaced by response builders
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Self::Fetch(FetchError::Transport(err))
    }
}

//! Error types for every layer of the service.
//!
//! Infrastructure failures (extraction, embedding, completion) are absorbed at
//! the agent boundary and surface as a failed reply. Registry conditions are
//! reported to the caller; see [`crate::agent::RegistryIssue`].

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Storage-layer errors (filesystem, sled, record encoding)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Index database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Failed to encode or decode index record: {0}")]
    Serialization(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Failures reported by the embedding or completion service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("Provider service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Provider request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether another attempt may succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::ServiceUnavailable(_)
                | ProviderError::RateLimited(_)
                | ProviderError::Timeout(_)
        )
    }
}

/// Text extraction failure for one source file.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unreadable document {path}: {reason}")]
    UnreadableDocument { path: PathBuf, reason: String },
}

/// Document index lifecycle errors.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Document '{name}' produced no extractable text; no index was persisted")]
    EmptyDocument { name: String },

    #[error("Agent '{name}' has not been initialized. Please process the document first.")]
    NotInitialized { name: String },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Errors surfaced to transports (CLI, HTTP).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Agent '{name}' not found. Available agents: {available:?}")]
    AgentNotFound { name: String, available: Vec<String> },

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

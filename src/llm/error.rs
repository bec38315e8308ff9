//! Transport error types

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while streaming from the provider
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid stream: {0}")]
    InvalidStream(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransportError {
    /// Check if the turn may transparently retry past this error
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Config(_) => false,
            TransportError::RateLimited { .. } => true,
            TransportError::Api { status, .. } => is_retryable_status(*status),
            TransportError::Network(_) => true,
            TransportError::InvalidStream(_) => false,
            TransportError::Json(_) => false,
        }
    }

    /// Numeric status carried by the underlying failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::RateLimited { .. } => Some(429),
            TransportError::Api { status, .. } => Some(*status),
            TransportError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// HTTP status codes worth a transparent reconnect
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

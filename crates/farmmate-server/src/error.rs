//! Gateway error types.

use thiserror::Error;

/// Errors raised while starting or running the gateway.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested bind address.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Accepting or serving connections failed.
    #[error("server I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The Prometheus recorder could not be installed.
    #[error("failed to install metrics recorder: {0}")]
    Metrics(String),
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, ServerError>;

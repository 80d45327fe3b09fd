//! Error types for the transport layer.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur in transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Rejected configuration; the transport was never constructed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network failure, non-2xx response, or unreadable body.
    #[error("network error: {0}")]
    Network(String),

    /// The backing store cannot perform this operation.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

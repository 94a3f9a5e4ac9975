//! Error types for receipt signing and storage.

use thiserror::Error;
use warden_primitives::ReceiptId;

/// Errors emitted by compliance components.
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// Signing key was rejected.
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(&'static str),
    /// Underlying I/O failure while reading or writing receipt files.
    #[error("i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },
    /// Serialization or deserialization error.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
    /// No receipt is stored under the requested identifier.
    #[error("receipt {0} not found")]
    NotFound(ReceiptId),
}

/// Result type alias for compliance operations.
pub type ComplianceResult<T> = Result<T, ComplianceError>;

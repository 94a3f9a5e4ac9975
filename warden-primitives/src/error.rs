//! Shared error definitions for governance primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the governance SDK.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided receipt identifier could not be parsed.
    #[error("invalid receipt id: {source}")]
    InvalidReceiptId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },
}

//! Core shared types for the Warden governance SDK.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
pub mod payload;

/// Error type and result alias shared across the SDK.
pub use error::{Error, Result};
/// Unique identifier for signed audit receipts.
pub use ids::ReceiptId;
/// JSON object carried through every evaluation.
pub use payload::{Payload, canonical_json, payload_digest, sha256_hex};

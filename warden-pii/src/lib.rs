//! PII detection and redaction for governed agent payloads.
//!
//! Six categories are recognised with fixed regular expressions: email
//! addresses, North-American phone numbers, social security numbers, credit
//! card numbers (Luhn-validated), IPv4 addresses, and prefixed API keys. When
//! detections of different categories overlap, the more specific category
//! wins so every physical match is replaced by exactly one token.

#![warn(missing_docs, clippy::pedantic)]

mod kind;
mod luhn;
mod patterns;
mod redactor;

pub use kind::{PiiType, UnknownPiiType};
pub use luhn::luhn_check;
pub use redactor::{PiiMatch, PiiRedactor, RedactionResult};

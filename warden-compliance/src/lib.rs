//! Tamper-evident audit receipts for governance decisions.
//!
//! A [`ReceiptGenerator`] turns one [`EvaluationResult`](warden_policy::EvaluationResult)
//! and its originating request into a [`PolicyReceipt`] signed with
//! HMAC-SHA256. Receipts can be persisted through any [`ReceiptStore`] and
//! verified later; any single-field change invalidates the signature.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod receipt;
pub mod store;

pub use error::{ComplianceError, ComplianceResult};
pub use receipt::{PolicyReceipt, ReceiptGenerator};
pub use store::{FileReceiptStore, MemoryReceiptStore, ReceiptStore};

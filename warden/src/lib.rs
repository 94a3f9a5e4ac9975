//! Governance SDK facade for AI agent pipelines.
//!
//! Depend on this crate via `cargo add warden`. It bundles the governance
//! crates behind feature flags so downstream users can enable only the parts
//! they need: PII redaction, policy evaluation, signed receipts, enforcement
//! adapters, configuration, and tracing setup.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use warden_primitives as primitives;

/// PII detection and redaction (enabled by `pii` feature).
#[cfg(feature = "pii")]
pub use warden_pii as pii;

/// Policy model and governance engine (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use warden_policy as policy;

/// Signed audit receipts and stores (enabled by `compliance` feature).
#[cfg(feature = "compliance")]
pub use warden_compliance as compliance;

/// Enforcement at framework boundaries (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use warden_adapters as adapters;

/// Configuration management (enabled by `config` feature).
#[cfg(feature = "config")]
pub use warden_config as config;

/// Tracing subscriber setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use warden_telemetry as telemetry;

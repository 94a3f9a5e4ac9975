//! Configuration management for governance deployments.
//!
//! A single YAML document describes the engine, the PII redactor, where
//! policies live, how receipts are signed and stored, and how tracing is set
//! up. Every field has a default, so an empty document is valid.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use schema::{
    EngineConfig, GovernanceConfig, PiiConfig, PoliciesConfig, ReceiptsConfig,
    DEFAULT_SIGNING_KEY_ENV,
};
pub use warden_telemetry::TelemetryConfig;

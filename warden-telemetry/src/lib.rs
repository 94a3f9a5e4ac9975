//! Observability utilities for governance services.

#![warn(missing_docs, clippy::pedantic)]

pub mod tracing_support;

pub use tracing_support::{TelemetryConfig, TelemetryError, TelemetryResult};

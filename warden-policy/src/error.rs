//! Errors surfaced while building or loading policies.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by policy construction, loading, and registry lookups.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Rule configuration error.
    #[error("invalid policy rule on `{field}`: {reason}")]
    InvalidRule {
        /// Field path of the offending rule.
        field: String,
        /// Human-readable explanation for operators.
        reason: String,
    },
    /// Policy configuration error.
    #[error("invalid policy: {0}")]
    InvalidPolicy(&'static str),
    /// YAML document could not be parsed into a policy.
    #[error("failed to parse policy yaml: {source}")]
    Yaml {
        /// Source parser error.
        #[from]
        source: serde_yaml::Error,
    },
    /// JSON value could not be converted into a policy.
    #[error("failed to parse policy json: {source}")]
    Json {
        /// Source conversion error.
        #[from]
        source: serde_json::Error,
    },
    /// Policy file or directory could not be read.
    #[error("failed to read policy source {}: {source}", path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Source I/O error.
        source: std::io::Error,
    },
    /// No policy is registered under the requested name.
    #[error("policy `{0}` not found")]
    NotFound(String),
}

impl PolicyError {
    /// Helper to construct rule errors from string-like values.
    #[must_use]
    pub fn invalid_rule(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

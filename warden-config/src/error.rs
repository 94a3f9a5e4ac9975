//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;
use warden_compliance::ComplianceError;
use warden_policy::PolicyError;

/// Errors raised while loading configuration or building components from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Source I/O error.
        source: std::io::Error,
    },
    /// Configuration document did not parse.
    #[error("invalid config yaml: {source}")]
    Yaml {
        /// Source parser error.
        #[from]
        source: serde_yaml::Error,
    },
    /// The signing key environment variable is unset or empty.
    #[error("signing key environment variable `{var}` is not set")]
    MissingSigningKey {
        /// Name of the variable that was consulted.
        var: String,
    },
    /// A referenced policy failed to load.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// A receipt component could not be built.
    #[error(transparent)]
    Compliance(#[from] ComplianceError),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

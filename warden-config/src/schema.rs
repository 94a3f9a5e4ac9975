//! Strongly typed configuration schemas.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use warden_pii::PiiType;
use warden_telemetry::TelemetryConfig;

/// Environment variable consulted for the receipt signing key by default.
pub const DEFAULT_SIGNING_KEY_ENV: &str = "WARDEN_SIGNING_KEY";

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Engine behaviour.
    pub engine: EngineConfig,
    /// PII redactor settings.
    pub pii: PiiConfig,
    /// Policy sources.
    pub policies: PoliciesConfig,
    /// Receipt signing and storage.
    pub receipts: ReceiptsConfig,
    /// Tracing subscriber settings.
    pub telemetry: TelemetryConfig,
    /// Directory relative policy and store paths resolve against. Set when
    /// the document is read from a file.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Engine behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Run PII auto-redaction even without an explicit redact rule.
    pub auto_redaction: bool,
    /// Install the built-in `pii-protection` policy.
    pub default_protection: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_redaction: true,
            default_protection: false,
        }
    }
}

/// PII redactor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiiConfig {
    /// Attach a redactor to the engine at all.
    pub enabled: bool,
    /// Categories the redactor detects. An empty list detects nothing.
    pub enabled_types: Vec<PiiType>,
}

impl Default for PiiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enabled_types: PiiType::ALL.to_vec(),
        }
    }
}

/// Policy sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoliciesConfig {
    /// Policy files or directories of `*.yaml` / `*.yml` files.
    pub paths: Vec<PathBuf>,
}

/// Receipt signing and storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptsConfig {
    /// Environment variable holding the HMAC signing key.
    pub signing_key_env: String,
    /// Directory for file-backed receipts. Receipts stay in memory when unset.
    pub store_dir: Option<PathBuf>,
}

impl Default for ReceiptsConfig {
    fn default() -> Self {
        Self {
            signing_key_env: DEFAULT_SIGNING_KEY_ENV.to_owned(),
            store_dir: None,
        }
    }
}

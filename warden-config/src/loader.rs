//! Configuration loading and component construction.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use warden_compliance::{FileReceiptStore, MemoryReceiptStore, ReceiptGenerator, ReceiptStore};
use warden_pii::PiiRedactor;
use warden_policy::{GovernanceEngine, Policy, PolicyLoader};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::GovernanceConfig;

impl GovernanceConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] when the document is malformed.
    pub fn from_yaml_str(source: &str) -> ConfigResult<Self> {
        // serde_yaml rejects an empty document, which should mean "all defaults".
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    /// Reads a configuration file. Relative paths inside it resolve against
    /// the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Yaml`] when it is malformed.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_yaml_str(&source)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        info!(path = %path.display(), "governance config loaded");
        Ok(config)
    }

    /// Resolves `path` against [`base_dir`](Self::base_dir).
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Loads every configured policy, in configuration order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Policy`] for the first policy source that fails.
    pub fn load_policies(&self) -> ConfigResult<Vec<Policy>> {
        let mut policies = Vec::new();
        for path in &self.policies.paths {
            let resolved = self.resolve(path);
            let loaded = PolicyLoader::load_path(&resolved)?;
            debug!(path = %resolved.display(), count = loaded.len(), "policy source loaded");
            policies.extend(loaded);
        }
        Ok(policies)
    }

    /// Builds the redactor described by the `pii` section.
    #[must_use]
    pub fn redactor(&self) -> Option<PiiRedactor> {
        self.pii
            .enabled
            .then(|| PiiRedactor::with_types(self.pii.enabled_types.iter().copied()))
    }

    /// Builds a governance engine: the built-in protection policy when
    /// requested, then every configured policy, the redactor, and the
    /// auto-redaction setting.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Policy`] when a policy source fails to load.
    pub fn build_engine(&self) -> ConfigResult<GovernanceEngine> {
        let mut builder = GovernanceEngine::builder().auto_redaction(self.engine.auto_redaction);
        if self.engine.default_protection {
            builder = builder.policy(Policy::default_pii_protection());
        }
        builder = builder.policies(self.load_policies()?);
        if let Some(redactor) = self.redactor() {
            builder = builder.redactor(redactor);
        }
        Ok(builder.build())
    }

    /// Reads the signing key from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSigningKey`] when the variable is unset
    /// or empty.
    pub fn signing_key(&self) -> ConfigResult<String> {
        self.signing_key_from(|name| std::env::var(name).ok())
    }

    fn signing_key_from<F>(&self, lookup: F) -> ConfigResult<String>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let var = self.receipts.signing_key_env.as_str();
        match lookup(var) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingSigningKey {
                var: var.to_owned(),
            }),
        }
    }

    /// Builds a receipt generator keyed from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSigningKey`] when no key is available.
    pub fn receipt_generator(&self) -> ConfigResult<ReceiptGenerator> {
        Ok(ReceiptGenerator::new(self.signing_key()?)?)
    }

    /// Opens the configured receipt store: file-backed when `store_dir` is
    /// set, in-memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Compliance`] when the store directory cannot be
    /// created.
    pub async fn receipt_store(&self) -> ConfigResult<Arc<dyn ReceiptStore>> {
        match &self.receipts.store_dir {
            Some(dir) => {
                let store = FileReceiptStore::open(self.resolve(dir)).await?;
                Ok(Arc::new(store))
            }
            None => Ok(Arc::new(MemoryReceiptStore::new())),
        }
    }
}

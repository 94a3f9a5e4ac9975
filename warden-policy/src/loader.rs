//! Loading policies from YAML documents and JSON values.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{PolicyError, PolicyResult};
use crate::policy::Policy;

/// Loads [`Policy`] values from policy documents.
///
/// A document has the shape:
///
/// ```yaml
/// name: api-security
/// description: Blocks internal network access
/// priority: 90
/// enabled: true
/// rules:
///   - field: source_ip
///     operator: regex
///     value: "^(10|192\\.168)\\."
///     action: deny
/// ```
///
/// Every document is fully validated while loading, so malformed operators,
/// actions, or regular expressions are rejected here rather than during
/// evaluation. A comparison rule written without a `value` still loads; it
/// simply never matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyLoader;

impl PolicyLoader {
    /// Parses a single policy from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Yaml`] when the text is not a valid policy.
    pub fn from_yaml_str(source: &str) -> PolicyResult<Policy> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Reads and parses a single policy file.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Io`] when the file cannot be read and
    /// [`PolicyError::Yaml`] when it is not a valid policy.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> PolicyResult<Policy> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|err| PolicyError::io(path, err))?;
        let policy = Self::from_yaml_str(&source)?;
        info!(path = %path.display(), name = policy.name(), "policy loaded from yaml");
        Ok(policy)
    }

    /// Converts an already-parsed JSON value into a policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Json`] when the value is not a valid policy.
    pub fn from_value(value: Value) -> PolicyResult<Policy> {
        Ok(serde_json::from_value(value)?)
    }

    /// Loads every `*.yaml` and `*.yml` file in `dir`, ordered by file name.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable directory entry or invalid policy file.
    pub fn load_dir(dir: impl AsRef<Path>) -> PolicyResult<Vec<Policy>> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|err| PolicyError::io(dir, err))?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry.map_err(|err| PolicyError::io(dir, err))?.path();
            if path.is_file() && is_policy_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        let policies = files
            .iter()
            .map(Self::from_yaml_file)
            .collect::<PolicyResult<Vec<_>>>()?;
        debug!(dir = %dir.display(), count = policies.len(), "policy directory loaded");
        Ok(policies)
    }

    /// Loads a single file or every policy file in a directory.
    ///
    /// # Errors
    ///
    /// See [`PolicyLoader::from_yaml_file`] and [`PolicyLoader::load_dir`].
    pub fn load_path(path: impl AsRef<Path>) -> PolicyResult<Vec<Policy>> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            Ok(vec![Self::from_yaml_file(path)?])
        }
    }
}

fn is_policy_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

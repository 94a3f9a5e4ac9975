//! JSON payload helpers: dot-path traversal, canonical encoding, and digests.
//!
//! Payloads are plain `serde_json` objects. Paths use `.` to separate object
//! keys (`user.email`); traversal only descends through objects, so a path that
//! crosses an array, a scalar, or a missing key simply resolves to nothing.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// JSON object evaluated by the governance engine. Keys keep the order the
/// caller inserted them in.
pub type Payload = Map<String, Value>;

/// Resolves a dot-separated `path` against `payload`.
///
/// Returns `None` when any segment is missing, when an intermediate value is
/// not an object, or when the addressed value is JSON `null`.
#[must_use]
pub fn lookup<'a>(payload: &'a Payload, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = payload.get(first)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    (!current.is_null()).then_some(current)
}

/// Replaces the value addressed by `path` with `replacement`.
///
/// Only existing leaves are replaced; the structure of the payload is never
/// extended. Returns `true` when a value was replaced.
pub fn replace_at(payload: &mut Payload, path: &str, replacement: Value) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return false;
    };

    let mut current = payload;
    for segment in parents {
        match current.get_mut(*segment) {
            Some(Value::Object(next)) => current = next,
            _ => return false,
        }
    }

    match current.get_mut(*leaf) {
        Some(slot) => {
            *slot = replacement;
            true
        }
        None => false,
    }
}

/// Returns a copy of `value` whose objects list their keys in sorted order at
/// every depth.
#[must_use]
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(canonical_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn canonical_map(map: &Map<String, Value>) -> Map<String, Value> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let mut sorted = Map::new();
    for key in keys {
        sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
    }
    sorted
}

/// Encodes `value` as compact JSON with recursively sorted object keys.
///
/// The output is stable across processes and independent of the insertion
/// order of the source maps, which makes it suitable for hashing and signing.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

/// Returns the lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(bytes.as_ref()))
}

/// Returns the SHA-256 digest of the canonical JSON form of `payload`.
#[must_use]
pub fn payload_digest(payload: &Payload) -> String {
    sha256_hex(Value::Object(canonical_map(payload)).to_string())
}

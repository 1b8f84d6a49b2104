//! Canonicalized portfolio-state hashing (spec §3, "Portfolio-state hash").
//!
//! The digest must be invariant to the ordering of mappings. `serde_json`
//! preserves insertion order for its default `Map` (or alphabetical, if the
//! `preserve_order` feature is off — we don't enable it), so callers should
//! build state as a `BTreeMap`-backed `Value` or pass pre-sorted pairs;
//! `canonical_hash` re-sorts all object keys recursively regardless, so
//! either input shape produces the same digest.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 256-bit digest, rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateHash(String);

impl StateHash {
    /// The empty/initial value the state monitor starts from (spec §4.7:
    /// "Initial value is empty").
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<empty>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Recursively sorts object keys so that two semantically equal but
/// differently-ordered JSON values canonicalize identically.
fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(&String, &serde_json::Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), canonicalize(v));
            }
            serde_json::Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Hashes any serializable value after canonicalizing key order, producing
/// a `StateHash` stable with respect to mapping iteration order.
pub fn canonical_hash<T: Serialize>(value: &T) -> StateHash {
    let raw = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
    let canon = canonicalize(&raw);
    // `to_string` on a `Value` built from a sorted `Map` is deterministic.
    let bytes = canon.to_string();
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_bytes());
    StateHash(format!("{:x}", hasher.finalize()))
}

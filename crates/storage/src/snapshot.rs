//! zstd-compressed JSON snapshot persistence, shared by the job-history and
//! expiring-cache stores. Mirrors the teacher's `crates/daemon/src/storage`
//! snapshot convention (versioned envelope, atomic write-then-rename) sized
//! down to the two small tables named in spec §6 — no WAL, since neither
//! table needs replay-from-log recovery (both are upsert-by-key caches that
//! safely default to "should run" / "absent" on a cold start, spec §4.8).

use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

use crate::error::StoreError;

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Envelope<T> {
    #[serde(rename = "v")]
    version: u32,
    data: T,
}

pub fn load<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no snapshot on disk, starting empty");
        return Ok(T::default());
    }
    let compressed = std::fs::read(path)?;
    let raw = zstd::decode_all(compressed.as_slice())
        .map_err(|e| StoreError::Compression(e.to_string()))?;
    let envelope: Envelope<T> = serde_json::from_slice(&raw)?;
    tracing::debug!(path = %path.display(), bytes = compressed.len(), "loaded snapshot");
    Ok(envelope.data)
}

pub fn save<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    let envelope = Envelope { version: SCHEMA_VERSION, data };
    let raw = serde_json::to_vec(&envelope)?;
    let compressed = zstd::encode_all(raw.as_slice(), 0).map_err(|e| StoreError::Compression(e.to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &compressed)?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), bytes = compressed.len(), "flushed snapshot");
    Ok(())
}

//! `cache` table (spec §6): `(key PRIMARY KEY, value, expires_at)`, upsert
//! semantics. Backs `sentinel_engine::ExpiringCache` for computed artifacts
//! (technical indicators, optimizer matrices) that are worth keeping warm
//! across a process restart but not worth a real database for.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::StoreError;
use crate::snapshot;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CacheRow {
    pub value: serde_json::Value,
    pub expires_at: u64,
}

pub trait ExpiringCacheStore: Send + Sync {
    /// Returns `None` if absent *or* if `expires_at <= now` (spec §4.2,
    /// §8: "reads a value strictly less than now as absent" — read as
    /// "not-after now", i.e. `<=`, matching the `Cleanup` sweep condition).
    fn get(&self, key: &str, now_epoch: u64) -> Option<serde_json::Value>;

    fn set(&self, key: &str, value: serde_json::Value, expires_at: u64) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError>;

    /// Removes every row with `expires_at <= now_epoch`; returns the count removed.
    fn cleanup(&self, now_epoch: u64) -> Result<usize, StoreError>;
}

#[derive(Clone, Default)]
pub struct InMemoryExpiringCacheStore {
    rows: Arc<Mutex<HashMap<String, CacheRow>>>,
}

impl ExpiringCacheStore for InMemoryExpiringCacheStore {
    fn get(&self, key: &str, now_epoch: u64) -> Option<serde_json::Value> {
        let rows = self.rows.lock();
        let row = rows.get(key)?;
        if row.expires_at <= now_epoch {
            return None;
        }
        Some(row.value.clone())
    }

    fn set(&self, key: &str, value: serde_json::Value, expires_at: u64) -> Result<(), StoreError> {
        self.rows.lock().insert(key.to_string(), CacheRow { value, expires_at });
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.rows.lock().remove(key);
        Ok(())
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|k, _| !k.starts_with(prefix));
        Ok(before - rows.len())
    }

    fn cleanup(&self, now_epoch: u64) -> Result<usize, StoreError> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|_, row| row.expires_at > now_epoch);
        Ok(before - rows.len())
    }
}

#[derive(Clone)]
pub struct FileExpiringCacheStore {
    path: PathBuf,
    rows: Arc<Mutex<HashMap<String, CacheRow>>>,
}

impl FileExpiringCacheStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let rows: HashMap<String, CacheRow> = snapshot::load(&path)?;
        Ok(Self { path, rows: Arc::new(Mutex::new(rows)) })
    }

    fn flush(&self) -> Result<(), StoreError> {
        snapshot::save(&self.path, &*self.rows.lock())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExpiringCacheStore for FileExpiringCacheStore {
    fn get(&self, key: &str, now_epoch: u64) -> Option<serde_json::Value> {
        let rows = self.rows.lock();
        let row = rows.get(key)?;
        if row.expires_at <= now_epoch {
            return None;
        }
        Some(row.value.clone())
    }

    fn set(&self, key: &str, value: serde_json::Value, expires_at: u64) -> Result<(), StoreError> {
        self.rows.lock().insert(key.to_string(), CacheRow { value, expires_at });
        self.flush()
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.rows.lock().remove(key);
        self.flush()
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let removed = {
            let mut rows = self.rows.lock();
            let before = rows.len();
            rows.retain(|k, _| !k.starts_with(prefix));
            before - rows.len()
        };
        if removed > 0 {
            self.flush()?;
        }
        Ok(removed)
    }

    fn cleanup(&self, now_epoch: u64) -> Result<usize, StoreError> {
        let removed = {
            let mut rows = self.rows.lock();
            let before = rows.len();
            rows.retain(|_, row| row.expires_at > now_epoch);
            before - rows.len()
        };
        if removed > 0 {
            self.flush()?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expired_rows_read_as_absent() {
        let store = InMemoryExpiringCacheStore::default();
        store.set("optimizer:matrix", json!({"a": 1}), 100).unwrap();
        assert!(store.get("optimizer:matrix", 50).is_some());
        assert!(store.get("optimizer:matrix", 100).is_none());
        assert!(store.get("optimizer:matrix", 150).is_none());
    }

    #[test]
    fn cleanup_removes_exactly_expired_rows_and_returns_count() {
        let store = InMemoryExpiringCacheStore::default();
        store.set("a", json!(1), 10).unwrap();
        store.set("b", json!(2), 100).unwrap();
        let removed = store.cleanup(50).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("a", 50).is_none());
        assert!(store.get("b", 50).is_some());
    }

    #[test]
    fn delete_prefix_removes_only_matching_keys() {
        let store = InMemoryExpiringCacheStore::default();
        store.set("planner:weights", json!(1), 1_000).unwrap();
        store.set("planner:context", json!(2), 1_000).unwrap();
        store.set("dividend:detected", json!(3), 1_000).unwrap();
        let removed = store.delete_prefix("planner:").unwrap();
        assert_eq!(removed, 2);
        assert!(store.get("dividend:detected", 0).is_some());
    }
}

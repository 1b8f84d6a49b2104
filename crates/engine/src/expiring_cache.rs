//! Expiring-key cache (spec §4.2): computed artifacts (technical
//! indicators, optimizer matrices) with a `(key, value, expires_at)`
//! triple. Backed by a `sentinel_storage::ExpiringCacheStore` so entries
//! can survive a process restart; this module only adds typed
//! serialize/deserialize at the edges.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use sentinel_storage::{ExpiringCacheStore, StoreError};

pub struct ExpiringCache {
    store: Arc<dyn ExpiringCacheStore>,
}

impl ExpiringCache {
    pub fn new(store: Arc<dyn ExpiringCacheStore>) -> Self {
        Self { store }
    }

    /// Reads a value strictly less than `now` as absent (spec §8).
    pub fn get<T: DeserializeOwned>(&self, key: &str, now_epoch: u64) -> Option<T> {
        let value = self.store.get(key, now_epoch)?;
        serde_json::from_value(value).ok()
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T, expires_at: u64) -> Result<(), StoreError> {
        let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.store.set(key, json, expires_at)
    }

    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.store.delete(key)
    }

    pub fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        self.store.delete_prefix(prefix)
    }

    /// Sweeps expired rows; returns the count removed (spec §4.2, §8).
    pub fn cleanup(&self, now_epoch: u64) -> Result<usize, StoreError> {
        self.store.cleanup(now_epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_storage::InMemoryExpiringCacheStore;

    #[test]
    fn typed_round_trip_through_json() {
        let cache = ExpiringCache::new(Arc::new(InMemoryExpiringCacheStore::default()));
        cache.set("technical:AAPL", &vec![1u32, 2, 3], 100).unwrap();
        let value: Option<Vec<u32>> = cache.get("technical:AAPL", 50);
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[test]
    fn expired_entry_reads_as_absent() {
        let cache = ExpiringCache::new(Arc::new(InMemoryExpiringCacheStore::default()));
        cache.set("technical:AAPL", &42u32, 100).unwrap();
        assert_eq!(cache.get::<u32>("technical:AAPL", 200), None);
    }

    #[test]
    fn cleanup_reports_removed_count() {
        let cache = ExpiringCache::new(Arc::new(InMemoryExpiringCacheStore::default()));
        cache.set("a", &1u32, 10).unwrap();
        cache.set("b", &2u32, 1_000).unwrap();
        assert_eq!(cache.cleanup(500).unwrap(), 1);
    }
}

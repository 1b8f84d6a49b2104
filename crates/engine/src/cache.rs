//! Run Cache (spec §4.2): process-wide coordination medium dependent work
//! types use to pass structured intermediate results without exposing them
//! on the public data model. Not a durability layer — entirely in memory.
//!
//! Values are stored as `Arc<dyn Any + Send + Sync>` rather than a
//! stringly `serde_json::Value`, so callers get back the concrete
//! pipeline-artifact type they put in (`OptimizerWeights`,
//! `OpportunityContext`, ...) instead of re-parsing JSON — the Rust
//! expression of the "tagged union of known artifact kinds" called for by
//! the source's `map[string]any` pattern (spec §9).

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct RunCache {
    entries: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl RunCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.entries.write().insert(key.into(), Arc::new(value));
    }

    /// Returns a clone of the stored value if present under `key` and the
    /// caller's requested type matches what was stored.
    pub fn get<T: Any + Send + Sync + Clone>(&self, key: &str) -> Option<T> {
        self.entries.read().get(key).and_then(|v| v.downcast_ref::<T>().cloned())
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// The invalidation primitive event triggers use (spec §4.2, §4.7).
    /// Returns the number of keys removed.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Weights {
        total_bp: u32,
    }

    #[test]
    fn round_trips_a_typed_value() {
        let cache = RunCache::new();
        cache.set("optimizer_weights", Weights { total_bp: 10_000 });
        assert!(cache.has("optimizer_weights"));
        assert_eq!(cache.get::<Weights>("optimizer_weights"), Some(Weights { total_bp: 10_000 }));
    }

    #[test]
    fn get_with_wrong_type_returns_none() {
        let cache = RunCache::new();
        cache.set("optimizer_weights", Weights { total_bp: 1 });
        assert_eq!(cache.get::<u32>("optimizer_weights"), None);
    }

    #[test]
    fn delete_prefix_clears_only_matching_keys() {
        let cache = RunCache::new();
        cache.set("planner:weights", Weights { total_bp: 1 });
        cache.set("planner:context", Weights { total_bp: 2 });
        cache.set("dividend:detected", Weights { total_bp: 3 });

        let removed = cache.delete_prefix("planner:");

        assert_eq!(removed, 2);
        assert!(!cache.has("planner:weights"));
        assert!(!cache.has("planner:context"));
        assert!(cache.has("dividend:detected"));
    }

    #[test]
    fn delete_removes_a_single_key() {
        let cache = RunCache::new();
        cache.set("trade_plan", Weights { total_bp: 5 });
        cache.delete("trade_plan");
        assert!(!cache.has("trade_plan"));
    }
}

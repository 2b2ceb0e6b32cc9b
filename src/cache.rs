// src/cache.rs
// =============================================================================
// Result cache for finished ingestions.
//
// The cache is advisory: a miss, an eviction or a stale entry only costs a
// re-fetch, never a wrong result. The pipeline receives it as a trait
// object, so tests can hand in NoopCache and nothing is ever shared
// through module-level state.
//
// Rust concepts:
// - Traits as seams: ResultCache lets callers plug in their own store
// - Generic traits: ResultCache<V> works for any cached value
// - Arc<V>: hand out cached values without copying them
// - parking_lot::Mutex: a lock that cannot be poisoned
// =============================================================================

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Get/set/invalidate over shared values.
pub trait ResultCache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<V>>;
    fn set(&self, key: String, value: Arc<V>);
    fn invalidate(&self, key: &str);
}

/// In-memory cache whose entries expire `ttl` after insertion.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Arc<V>)>>,
}

impl<V> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored entries, expired ones included until they are
    /// looked up or purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.lock().retain(|_, (expires, _)| *expires > now);
    }
}

impl<V: Send + Sync> ResultCache<V> for TtlCache<V> {
    fn get(&self, key: &str) -> Option<Arc<V>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((expires, value)) if *expires > Instant::now() => Some(Arc::clone(value)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: String, value: Arc<V>) {
        let expires = Instant::now() + self.ttl;
        self.entries.lock().insert(key, (expires, value));
    }

    fn invalidate(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

/// Cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl<V> ResultCache<V> for NoopCache {
    fn get(&self, _key: &str) -> Option<Arc<V>> {
        None
    }

    fn set(&self, _key: String, _value: Arc<V>) {}

    fn invalidate(&self, _key: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_cache_hit_and_invalidate() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a".to_string(), Arc::new(1));
        assert_eq!(cache.get("a").as_deref(), Some(&1));

        cache.invalidate("a");
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.set("a".to_string(), Arc::new("value"));
        assert!(cache.get("a").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.set("a".to_string(), Arc::new(1));
        cache.set("b".to_string(), Arc::new(2));
        assert_eq!(cache.len(), 2);
        cache.purge_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_noop_cache_never_hits() {
        let cache = NoopCache;
        ResultCache::<u32>::set(&cache, "a".to_string(), Arc::new(1));
        assert!(ResultCache::<u32>::get(&cache, "a").is_none());
    }
}

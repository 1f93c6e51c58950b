//! In-memory LRU cache for store query results
//!
//! The store is read-only while serving, so a `COUNT(*)` for a given filter
//! set never changes until the next import, which clears the cache.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Default number of distinct filter sets whose totals are remembered.
pub const COUNT_CACHE_CAPACITY: usize = 256;

/// Thread-safe LRU cache. A poisoned lock degrades to a cache miss.
pub struct MemoryCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    entries: Mutex<LruCache<K, V>>,
    capacity: usize,
}

impl<K, V> MemoryCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Create a cache holding up to `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity: capacity.get(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn put(&self, key: K, value: V) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(key, value);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// (entries in use, capacity)
    pub fn stats(&self) -> (usize, usize) {
        let used = self.entries.lock().map(|entries| entries.len()).unwrap_or(0);
        (used, self.capacity)
    }
}

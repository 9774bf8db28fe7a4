//! A bounded, strictly-ordered LRU cache shared across predicate
//! evaluations.
//!
//! `lru::LruCache` (rather than the teacher's `moka::sync::Cache`) is the
//! backing store here: the constraint engine's cache invariants require
//! exact "eldest evicted first, touch-on-read" semantics, which moka's
//! TinyLFU admission policy does not guarantee. `moka` stays the right
//! choice for the teacher's parse cache, where hit-rate under skewed access
//! matters more than eviction order; it is the wrong choice here.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache as RawLruCache;

/// Thread-safe bounded cache with strict least-recently-used eviction.
///
/// Every `get` that hits, and every `put`, marks the key as most-recently
/// used; once the cache is at capacity the next `put` for a new key evicts
/// whichever key was least recently touched.
pub struct BoundedCache<K, V> {
    inner: Mutex<RawLruCache<K, V>>,
    capacity: usize,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Build a cache holding at most `capacity` entries. `capacity` of `0`
    /// is coerced to `1` since `lru::LruCache` has no unbounded mode.
    pub fn new(capacity: u64) -> Self {
        let capacity = capacity.max(1) as usize;
        let nz = NonZeroUsize::new(capacity).expect("capacity coerced to at least 1");
        Self {
            inner: Mutex::new(RawLruCache::new(nz)),
            capacity,
        }
    }

    /// Look up `key`, promoting it to most-recently-used on a hit.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.lock().expect("cache mutex poisoned");
        guard.get(key).cloned()
    }

    /// Insert or overwrite `key`, promoting it to most-recently-used.
    /// Evicts the least-recently-used entry if the cache was already full
    /// and `key` is new.
    pub fn put(&self, key: K, value: V) {
        let mut guard = self.inner.lock().expect("cache mutex poisoned");
        guard.put(key, value);
    }

    /// Returns a cached value for `key`, computing and storing it via
    /// `compute` on a miss. `compute` runs at most once per miss, and never
    /// runs again for `key` until it is evicted — the property the
    /// class/subclass predicates rely on to bound collaborator calls.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let value = compute()?;
        self.put(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.inner.lock().expect("cache mutex poisoned").clear();
    }
}

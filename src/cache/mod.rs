//! Caching subsystem.
//!
//! # Data Flow
//! ```text
//! IconEngine::resolve_icon
//!     → SharedCache::get (hit → shared fetch handle, coalesced)
//!     → miss: fetch chain created, SharedCache::set(key, handle)
//!     → chain failure: SharedCache::remove_if(key, is_own_handle)
//! ```
//!
//! # Design Decisions
//! - `lru.rs` is generic and knows nothing about icons
//! - Values are handles to in-progress-or-completed work, so pending and
//!   resolved entries share one map and coalescing needs no extra bookkeeping
//! - The mutex is only held between suspension points, never across `.await`

pub mod lru;

use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

pub use self::lru::BoundedCache;

use crate::error::IconResult;

/// A `BoundedCache` shareable between tasks.
pub struct SharedCache<K, V> {
    inner: Mutex<BoundedCache<K, V>>,
}

impl<K: Hash + Eq, V> std::fmt::Debug for SharedCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.lock() {
            Ok(cache) => f.debug_tuple("SharedCache").field(&*cache).finish(),
            Err(_) => f.write_str("SharedCache(<poisoned>)"),
        }
    }
}

impl<K, V> SharedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> IconResult<Self> {
        Ok(Self {
            inner: Mutex::new(BoundedCache::new(capacity)?),
        })
    }

    fn lock(&self) -> MutexGuard<'_, BoundedCache<K, V>> {
        // Cache operations cannot leave the map half-updated, so a poisoned
        // lock still holds a consistent cache.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Clone of the value for `key`, marking it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn peek(&self, key: &K) -> Option<V> {
        self.lock().peek(key).cloned()
    }

    /// Insert or update, returning the evicted entry if any.
    pub fn set(&self, key: K, value: V) -> Option<(K, V)> {
        self.lock().set(key, value)
    }

    pub fn delete(&self, key: &K) -> Option<V> {
        self.lock().delete(key)
    }

    /// Remove `key` only when its current value satisfies `pred`.
    pub fn remove_if(&self, key: &K, pred: impl FnOnce(&V) -> bool) -> bool {
        let mut cache = self.lock();
        match cache.peek(key) {
            Some(value) if pred(value) => {
                cache.delete(key);
                true
            }
            _ => false,
        }
    }

    /// Return the value for `key` (marking it most recently used), or insert
    /// the one built by `make`. The flag is true when `make` ran.
    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> (V, bool) {
        let mut cache = self.lock();
        if let Some(existing) = cache.get(&key) {
            return (existing.clone(), false);
        }
        let value = make();
        cache.set(key, value.clone());
        (value, true)
    }

    /// Insert `value` unless the key holds a value accepted by `keep`.
    ///
    /// Returns the value that occupies the key afterwards.
    pub fn set_unless(&self, key: K, value: V, keep: impl FnOnce(&V) -> bool) -> V {
        let mut cache = self.lock();
        if let Some(existing) = cache.peek(&key) {
            if keep(existing) {
                return existing.clone();
            }
        }
        cache.set(key, value.clone());
        value
    }

    pub fn has(&self, key: &K) -> bool {
        self.lock().has(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    pub fn clear(&self) {
        self.lock().clear()
    }

    /// Snapshot of keys in recency order (LRU first).
    pub fn keys(&self) -> Vec<K> {
        self.lock().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_if_matches_only_own_value() {
        let cache = SharedCache::new(4).unwrap();
        cache.set("k", 1);

        assert!(!cache.remove_if(&"k", |v| *v == 2));
        assert!(cache.has(&"k"));
        assert!(cache.remove_if(&"k", |v| *v == 1));
        assert!(!cache.has(&"k"));
        assert!(!cache.remove_if(&"k", |_| true));
    }

    #[test]
    fn test_set_unless_keeps_foreign_value() {
        let cache = SharedCache::new(4).unwrap();
        assert_eq!(cache.set_unless("k", 1, |_| true), 1);
        assert_eq!(cache.set_unless("k", 2, |v| *v != 2), 1);
        assert_eq!(cache.set_unless("k", 2, |_| false), 2);
        assert_eq!(cache.peek(&"k"), Some(2));
    }

    #[test]
    fn test_get_or_insert_with_builds_once() {
        let cache = SharedCache::new(2).unwrap();
        assert_eq!(cache.get_or_insert_with("k", || 1), (1, true));
        assert_eq!(cache.get_or_insert_with("k", || 2), (1, false));

        cache.set("x", 9);
        // "k" was refreshed by the hit above, so "x" is not the one evicted.
        cache.get_or_insert_with("k", || 3);
        cache.set("y", 10);
        assert!(cache.has(&"k"));
        assert!(!cache.has(&"x"));
    }

    #[test]
    fn test_keys_in_recency_order() {
        let cache = SharedCache::new(3).unwrap();
        cache.set("a", 1);
        cache.set("b", 2);
        cache.get(&"a");
        assert_eq!(cache.keys(), vec!["b", "a"]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.capacity(), 3);
    }
}

//! Recency-ordered bounded cache.
//!
//! # Responsibilities
//! - Fixed-capacity key/value storage with O(1) get/set/delete
//! - Evict the least-recently-used entry when a new key arrives at capacity
//! - Iterate entries from least- to most-recently used
//!
//! # Design Decisions
//! - Storage and recency order come from `lru::LruCache`; this type pins the
//!   capacity rules and the update-vs-evict return contract
//! - `LruCache` iterates most recent first, so `iter` reverses it

use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

use ::lru::LruCache;

use crate::error::{IconError, IconResult};

/// A least-recently-used cache with a fixed positive capacity.
pub struct BoundedCache<K, V> {
    inner: LruCache<K, V>,
}

impl<K: Hash + Eq, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("len", &self.inner.len())
            .field("capacity", &self.inner.cap())
            .finish()
    }
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq,
{
    /// Create an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> IconResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            IconError::InvalidConfiguration("cache capacity must be a positive integer".to_string())
        })?;
        Ok(Self {
            inner: LruCache::new(capacity),
        })
    }

    /// Look up `key` and mark it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Look up `key` without touching its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.inner.peek(key)
    }

    /// Insert or update `key`.
    ///
    /// Updating an existing key marks it most recently used. Inserting a new
    /// key into a full cache evicts the least-recently-used entry first and
    /// returns it.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.inner.contains(&key) {
            self.inner.put(key, value);
            return None;
        }
        self.inner.push(key, value)
    }

    /// Remove `key`, returning its value.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        self.inner.pop(key)
    }

    pub fn has(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Entries from least- to most-recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.inner.iter().rev()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

/// Iterator over cache entries in recency order (LRU first).
pub type Iter<'a, K, V> = std::iter::Rev<::lru::Iter<'a, K, V>>;

impl<'a, K, V> IntoIterator for &'a BoundedCache<K, V>
where
    K: Hash + Eq,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(cache: &BoundedCache<&'static str, u32>) -> Vec<&'static str> {
        cache.keys().copied().collect()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = BoundedCache::<String, u32>::new(0).unwrap_err();
        assert!(matches!(err, IconError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_evicts_first_inserted() {
        let mut cache = BoundedCache::new(3).unwrap();
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        let evicted = cache.set("d", 4);
        assert_eq!(evicted, Some(("a", 1)));
        assert!(!cache.has(&"a"));
        assert_eq!(cache.len(), 3);
        assert_eq!(keys(&cache), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = BoundedCache::new(2).unwrap();
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.get(&"a"), Some(&1));

        cache.set("c", 3);
        assert!(cache.has(&"a"));
        assert!(!cache.has(&"b"));
        assert_eq!(keys(&cache), vec!["a", "c"]);
    }

    #[test]
    fn test_peek_keeps_recency() {
        let mut cache = BoundedCache::new(2).unwrap();
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.peek(&"a"), Some(&1));

        cache.set("c", 3);
        assert!(!cache.has(&"a"));
        assert_eq!(keys(&cache), vec!["b", "c"]);
    }

    #[test]
    fn test_update_existing_does_not_evict() {
        let mut cache = BoundedCache::new(2).unwrap();
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.set("a", 10), None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek(&"a"), Some(&10));
        assert_eq!(keys(&cache), vec!["b", "a"]);
    }

    #[test]
    fn test_delete_frees_capacity() {
        let mut cache = BoundedCache::new(2).unwrap();
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.delete(&"a"), Some(1));
        assert_eq!(cache.delete(&"a"), None);
        assert_eq!(cache.len(), 1);

        cache.set("c", 3);
        assert_eq!(cache.set("d", 4), Some(("b", 2)));
        assert_eq!(keys(&cache), vec!["c", "d"]);
    }

    #[test]
    fn test_delete_middle_keeps_links() {
        let mut cache = BoundedCache::new(4).unwrap();
        for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
            cache.set(k, v);
        }
        cache.delete(&"b");
        assert_eq!(keys(&cache), vec!["a", "c"]);
        let values: Vec<u32> = cache.values().copied().collect();
        assert_eq!(values, vec![1, 3]);
    }

    #[test]
    fn test_clear() {
        let mut cache = BoundedCache::new(2).unwrap();
        cache.set("a", 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.iter().count(), 0);
        cache.set("b", 2);
        assert_eq!(keys(&cache), vec!["b"]);
    }

    #[test]
    fn test_capacity_one() {
        let mut cache = BoundedCache::new(1).unwrap();
        cache.set("a", 1);
        assert_eq!(cache.set("b", 2), Some(("a", 1)));
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.capacity(), 1);
    }
}

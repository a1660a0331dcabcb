//! Single-owner LRU cache.
//!
//! Combines a `HashMap` from key to slot index with the arena recency list
//! in [`crate::list`]. Every access to a resident key, read or write, moves
//! it to the most recently used end, so [`LruCache::get`] takes `&mut self`.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::error::CacheError;
use crate::list::{Iter, OrderList};
use crate::stats::CacheStats;

/// Upper bound on storage reserved at construction. Larger caches grow as
/// entries arrive.
const MAX_PRESIZE: usize = 1024;

/// Fixed-capacity least-recently-used cache.
pub struct LruCache<K, V> {
    capacity: usize,
    index: HashMap<K, usize>,
    order: OrderList<K, V>,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// Returns [`CacheError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        debug!("Created LRU cache with capacity {}", capacity);

        let presize = capacity.min(MAX_PRESIZE);
        Ok(Self {
            capacity,
            index: HashMap::with_capacity(presize),
            order: OrderList::with_capacity(presize),
            stats: CacheStats::default(),
        })
    }

    /// Returns the value for `key` and marks it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&idx) = self.index.get(key) else {
            self.stats.misses += 1;
            trace!("Cache miss");
            return None;
        };

        self.stats.hits += 1;
        trace!("Cache hit at slot {}", idx);
        self.order.move_to_front(idx);
        self.order.value(idx)
    }

    /// Inserts or overwrites `key`, leaving it most recently used.
    ///
    /// A new key arriving at full capacity first evicts the least recently
    /// used entry, which is returned.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(slot) = self.order.value_mut(idx) {
                *slot = value;
            }
            self.order.move_to_front(idx);
            self.stats.updates += 1;
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let idx = self.order.push_front(key.clone(), value);
        self.index.insert(key, idx);
        self.stats.inserts += 1;

        evicted
    }

    /// Returns the value for `key` without touching recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &idx = self.index.get(key)?;
        self.order.value(idx)
    }

    /// Whether `key` is resident. Does not touch recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.index.remove(key)?;
        self.order.remove(idx).map(|(_, v)| v)
    }

    /// Drops every entry. Capacity and stats are kept.
    pub fn clear(&mut self) {
        debug!("Clearing {} cached entries", self.index.len());
        self.index.clear();
        self.order.clear();
    }

    /// Resident keys, least recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.order.iter().rev().map(|(k, _)| k.clone()).collect()
    }

    /// Resident entries, least recently used first.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        V: Clone,
    {
        self.order
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Checks that the index and recency list describe the same entries and
    /// that the cache is within capacity.
    pub fn validate(&self) -> Result<(), CacheError> {
        let listed = self.order.check_links()?;

        if listed != self.index.len() {
            return Err(CacheError::Corrupted(format!(
                "index holds {} keys but list holds {} entries",
                self.index.len(),
                listed
            )));
        }
        if listed > self.capacity {
            return Err(CacheError::Corrupted(format!(
                "{} entries exceed capacity {}",
                listed, self.capacity
            )));
        }
        for (key, &idx) in &self.index {
            if self.order.key(idx) != Some(key) {
                return Err(CacheError::Corrupted(format!(
                    "index points at slot {} holding a different key",
                    idx
                )));
            }
        }

        Ok(())
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let (key, value) = self.order.pop_back()?;
        self.index.remove(&key);
        self.stats.evictions += 1;
        debug!(
            "Evicted least recently used entry ({}/{} resident)",
            self.index.len(),
            self.capacity
        );
        Some((key, value))
    }
}

impl<K, V> LruCache<K, V> {
    /// Maximum number of resident entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.len() == 0
    }

    /// Iterates entries from most to least recently used without touching
    /// recency.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.order.iter()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }
}

impl<'a, K, V> IntoIterator for &'a LruCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get_promotes_in_keys() {
        let mut cache = LruCache::new(2).unwrap();
        assert_eq!(cache.put("key1", "value1"), None);
        assert_eq!(cache.put("key2", "value2"), None);
        assert_eq!(cache.keys(), vec!["key1", "key2"]);

        assert_eq!(cache.get(&"key1"), Some(&"value1"));
        assert_eq!(cache.keys(), vec!["key2", "key1"]);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result: Result<LruCache<&str, i32>, _> = LruCache::new(0);
        assert_eq!(result.unwrap_err(), CacheError::InvalidCapacity(0));
    }

    #[test]
    fn test_huge_capacity_fills_lazily() {
        let mut cache = LruCache::<u32, u32>::new(usize::MAX).unwrap();
        assert_eq!(cache.capacity(), usize::MAX);
        assert_eq!(cache.put(1, 10), None);
        assert_eq!(cache.peek(&1), Some(&10));
        cache.validate().unwrap();

        let mut large = LruCache::<u32, u32>::new(usize::MAX / 2).unwrap();
        for i in 0..2_000 {
            large.put(i, i);
        }
        assert_eq!(large.len(), 2_000);
        assert_eq!(large.stats().evictions, 0);
    }

    #[test]
    fn test_update_existing_key_keeps_slot_and_promotes() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("key1", "value1");
        cache.put("key2", "value2");
        assert_eq!(cache.put("key1", "value1_updated"), None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["key2", "key1"]);
        assert_eq!(cache.peek(&"key1"), Some(&"value1_updated"));
        assert_eq!(cache.stats().updates, 1);
    }

    #[test]
    fn test_get_shields_key_from_next_eviction() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("key1", "value1");
        cache.put("key2", "value2");
        cache.get(&"key1");

        assert_eq!(cache.put("key3", "value3"), Some(("key2", "value2")));
        assert_eq!(cache.keys(), vec!["key1", "key3"]);
        assert!(!cache.contains(&"key2"));
    }

    #[test]
    fn test_eviction_follows_access_order() {
        let mut cache = LruCache::new(3).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.get(&"a");
        cache.get(&"b");
        assert_eq!(cache.keys(), vec!["c", "a", "b"]);

        assert_eq!(cache.put("d", 4), Some(("c", 3)));
        assert_eq!(cache.keys(), vec!["a", "b", "d"]);

        assert_eq!(cache.put("e", 5), Some(("a", 1)));
        assert_eq!(cache.keys(), vec!["b", "d", "e"]);
    }

    #[test]
    fn test_single_capacity_replaces_on_every_new_key() {
        let mut cache = LruCache::new(1).unwrap();
        assert_eq!(cache.put("key1", "value1"), None);
        assert_eq!(cache.put("key2", "value2"), Some(("key1", "value1")));
        assert_eq!(cache.put("key2", "value2b"), None);
        assert_eq!(cache.put("key3", "value3"), Some(("key2", "value2b")));

        assert_eq!(cache.keys(), vec!["key3"]);
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_overwrite_changes_eviction_victim() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("key1", "value1");
        cache.put("key2", "value2");

        // Overwriting also promotes
        cache.put("key1", "value1_updated");
        assert_eq!(cache.put("key3", "value3"), Some(("key2", "value2")));
        assert_eq!(cache.entries(), vec![("key1", "value1_updated"), ("key3", "value3")]);
    }

    #[test]
    fn test_nonexistent_key() {
        let mut cache: LruCache<&str, &str> = LruCache::new(2).unwrap();
        assert_eq!(cache.get(&"nonexistent"), None);
        assert_eq!(cache.stats().misses, 1);
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn test_multiple_evictions() {
        let mut cache = LruCache::new(3).unwrap();
        cache.put(1, "one");
        cache.put(2, "two");
        cache.put(3, "three");

        cache.get(&1);
        assert_eq!(cache.put(4, "four"), Some((2, "two")));
        assert_eq!(cache.keys(), vec![3, 1, 4]);

        cache.get(&3);
        assert_eq!(cache.keys(), vec![1, 4, 3]);

        assert_eq!(cache.put(5, "five"), Some((1, "one")));
        assert!(!cache.contains(&1));
        assert_eq!(cache.peek(&4), Some(&"four"));
        assert_eq!(cache.keys(), vec![4, 3, 5]);
        cache.validate().unwrap();
    }

    #[test]
    fn test_keys_scan_from_least_recent() {
        let mut cache = LruCache::new(3).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.get(&"a");

        assert_eq!(cache.keys(), vec!["b", "c", "a"]);
        assert_eq!(cache.entries(), vec![("b", 2), ("c", 3), ("a", 1)]);

        let mru_first: Vec<_> = cache.iter().map(|(k, _)| *k).collect();
        assert_eq!(mru_first, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_peek_and_contains_do_not_promote() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);

        assert_eq!(cache.peek(&"a"), Some(&1));
        assert!(cache.contains(&"a"));

        // 'a' stays least recently used
        cache.put("c", 3);
        assert!(!cache.contains(&"a"));
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_remove_frees_a_slot() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);

        assert_eq!(cache.remove(&"a"), Some(1));
        assert_eq!(cache.remove(&"a"), None);
        assert_eq!(cache.len(), 1);

        // Room for another key without evicting 'b'
        assert_eq!(cache.put("c", 3), None);
        assert_eq!(cache.keys(), vec!["b", "c"]);
        cache.validate().unwrap();
    }

    #[test]
    fn test_clear_keeps_capacity_and_stats() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("a", 1);
        cache.get(&"a");
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 2);
        assert_eq!(cache.stats().hits, 1);
        assert!(cache.keys().is_empty());
        cache.validate().unwrap();
    }

    #[test]
    fn test_borrowed_lookup_on_owned_keys() {
        let mut cache: LruCache<String, u32> = LruCache::new(2).unwrap();
        cache.put("alpha".to_string(), 1);

        assert_eq!(cache.get("alpha"), Some(&1));
        assert!(cache.contains("alpha"));
        assert_eq!(cache.remove("alpha"), Some(1));
    }

    #[test]
    fn test_stats_track_every_path() {
        let mut cache = LruCache::new(1).unwrap();
        cache.put("a", 1);
        cache.put("a", 2);
        cache.put("b", 3);
        cache.get(&"a");
        cache.get(&"b");

        let stats = cache.stats();
        assert_eq!(stats.inserts, 2);
        assert_eq!(stats.updates, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        cache.reset_stats();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_debug_does_not_require_debug_keys() {
        struct Opaque;
        let mut cache = LruCache::new(1).unwrap();
        cache.put(1u8, Opaque);
        let rendered = format!("{:?}", cache);
        assert!(rendered.contains("capacity: 1"));
        assert!(rendered.contains("len: 1"));
    }
}

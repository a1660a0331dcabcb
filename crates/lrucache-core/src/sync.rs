//! Thread-safe handle around [`LruCache`].
//!
//! Every operation, `get` included, takes the same `Mutex`: a lookup
//! reorders the recency list, so a shared read lock would not be sound.
//! Values are cloned out of the critical section; callers never hold
//! references into the cache.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::cache::LruCache;
use crate::error::CacheError;
use crate::stats::CacheStats;

/// Cloneable, thread-safe LRU cache handle. Clones share the same storage.
#[derive(Debug)]
pub struct SyncLruCache<K, V> {
    inner: Arc<Mutex<LruCache<K, V>>>,
}

impl<K, V> Clone for SyncLruCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> From<LruCache<K, V>> for SyncLruCache<K, V> {
    fn from(cache: LruCache<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }
}

impl<K, V> SyncLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty shared cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        LruCache::new(capacity).map(Self::from)
    }

    /// Returns a clone of the value for `key` and marks it most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().get(key).cloned()
    }

    /// Inserts or overwrites `key`. Returns the evicted entry, if any.
    pub fn put(&self, key: K, value: V) -> Option<(K, V)> {
        self.lock().put(key, value)
    }

    /// Returns the cached value for `key`, or computes, stores and returns
    /// it. Lookup and insert happen under one lock acquisition, so `init`
    /// must not call back into this cache.
    pub fn get_or_insert_with<F>(&self, key: K, init: F) -> V
    where
        F: FnOnce() -> V,
    {
        let mut cache = self.lock();
        if let Some(value) = cache.get(&key) {
            return value.clone();
        }
        let value = init();
        cache.put(key, value.clone());
        value
    }

    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().peek(key).cloned()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().contains(key)
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().remove(key)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Snapshot of resident keys, least recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.lock().keys()
    }

    /// Snapshot of resident entries, least recently used first.
    pub fn entries(&self) -> Vec<(K, V)> {
        self.lock().entries()
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        self.lock().validate()
    }
}

impl<K, V> SyncLruCache<K, V> {
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    pub fn reset_stats(&self) {
        self.lock().reset_stats();
    }

    /// Acquires the cache lock, clearing poison. The list code never panics
    /// between unlinking and relinking a slot, but `put` runs the key's
    /// `Hash`/`Eq` between detaching an evicted entry and dropping it from the
    /// index. Recovery assumes those impls do not panic.
    fn lock(&self) -> MutexGuard<'_, LruCache<K, V>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("LRU cache lock was poisoned, recovering");
            self.inner.clear_poison();
            poisoned.into_inner()
        })
    }
}

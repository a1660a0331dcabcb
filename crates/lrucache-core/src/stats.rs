//! Hit/miss/eviction counters.

use serde::{Deserialize, Serialize};

/// Counters accumulated by a cache since construction or the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// `get` calls that found the key.
    pub hits: u64,
    /// `get` calls that did not.
    pub misses: u64,
    /// `put` calls that added a new key.
    pub inserts: u64,
    /// `put` calls that overwrote an existing key.
    pub updates: u64,
    /// Entries dropped to make room for a new key.
    pub evictions: u64,
}

impl CacheStats {
    /// Total `get` calls.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

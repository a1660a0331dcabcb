//! Fixed-capacity least-recently-used cache.
//!
//! This crate provides:
//! - [`LruCache`]: single-owner cache with O(1) `get`/`put`
//! - [`SyncLruCache`]: cloneable handle that serializes every operation
//!   behind one `Mutex`, for use across threads
//! - [`CacheStats`]: hit/miss/insert/update/eviction counters
//!
//! Entries live in an arena and are linked by slot index between two
//! permanent sentinels, so promotion and eviction never scan.
//!
//! ```
//! use lrucache_core::LruCache;
//!
//! let mut cache = LruCache::new(2).unwrap();
//! cache.put("a", 1);
//! cache.put("b", 2);
//! assert_eq!(cache.get(&"a"), Some(&1));
//!
//! cache.put("c", 3); // evicts "b"
//! assert_eq!(cache.get(&"b"), None);
//! assert_eq!(cache.keys(), vec!["a", "c"]);
//! ```

mod list;

pub mod cache;
pub mod error;
pub mod stats;
pub mod sync;

// Re-exports
pub use cache::LruCache;
pub use error::CacheError;
pub use list::Iter;
pub use stats::CacheStats;
pub use sync::SyncLruCache;

//! Error types for cache construction and integrity checks.

use thiserror::Error;

/// Errors reported by the cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Capacity must hold at least one entry.
    #[error("Invalid capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// The index and recency list disagree.
    #[error("Cache structure corrupted: {0}")]
    Corrupted(String),
}

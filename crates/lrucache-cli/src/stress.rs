//! Concurrent stress run against a shared cache.
//!
//! Each worker owns a disjoint key range and interleaves puts with reads of
//! its own keys. After all workers finish, the cache structure is validated.

use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use lrucache_core::{CacheStats, SyncLruCache};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Parameters for a stress run.
#[derive(Debug, Clone, Copy)]
pub struct StressOptions {
    pub capacity: usize,
    pub workers: usize,
    pub ops_per_worker: usize,
}

/// Outcome of a stress run.
#[derive(Debug, Clone, Serialize)]
pub struct StressReport {
    pub capacity: usize,
    pub workers: usize,
    pub ops_per_worker: usize,
    /// Resident entries after all workers finished.
    pub len: usize,
    /// Reads that returned a value other than the one written for that key.
    pub mismatches: u64,
    pub stats: CacheStats,
    pub elapsed_ms: u128,
    /// Structural check failure, if any.
    pub validation_error: Option<String>,
}

impl StressReport {
    pub fn passed(&self) -> bool {
        self.mismatches == 0 && self.validation_error.is_none() && self.len <= self.capacity
    }
}

fn value_for(key: u64) -> u64 {
    key.wrapping_mul(31).wrapping_add(7)
}

/// Runs `workers` blocking tasks against one [`SyncLruCache`].
pub async fn run_stress(options: StressOptions) -> Result<StressReport> {
    let cache: SyncLruCache<u64, u64> = SyncLruCache::new(options.capacity)?;
    let ops = options.ops_per_worker as u64;
    // Every worker key must fit in u64.
    (options.workers as u64).checked_mul(ops).ok_or_else(|| {
        anyhow!(
            "{} workers x {} ops overflows the key space",
            options.workers,
            options.ops_per_worker
        )
    })?;

    info!(
        "Starting stress run: {} workers x {} ops, capacity {}",
        options.workers, options.ops_per_worker, options.capacity
    );
    let started = Instant::now();

    let handles: Vec<_> = (0..options.workers as u64)
        .map(|worker| {
            let cache = cache.clone();
            tokio::task::spawn_blocking(move || {
                let base = worker * ops;
                let mut mismatches = 0u64;
                for i in 0..ops {
                    let key = base + i;
                    cache.put(key, value_for(key));

                    // Re-read this key and an older one from the same range.
                    for probe in [key, base + i / 2] {
                        if let Some(value) = cache.get(&probe) {
                            if value != value_for(probe) {
                                mismatches += 1;
                            }
                        }
                    }
                }
                debug!("Worker {} finished", worker);
                mismatches
            })
        })
        .collect();

    let mut mismatches = 0;
    for handle in handles {
        mismatches += handle.await.context("stress worker panicked")?;
    }

    let validation_error = cache.validate().err().map(|e| e.to_string());
    if let Some(error) = &validation_error {
        warn!("Cache failed validation after stress run: {}", error);
    }

    let report = StressReport {
        capacity: options.capacity,
        workers: options.workers,
        ops_per_worker: options.ops_per_worker,
        len: cache.len(),
        mismatches,
        stats: cache.stats(),
        elapsed_ms: started.elapsed().as_millis(),
        validation_error,
    };

    info!(
        "Stress run finished in {}ms ({} evictions, hit rate {:.2})",
        report.elapsed_ms,
        report.stats.evictions,
        report.stats.hit_rate()
    );
    Ok(report)
}

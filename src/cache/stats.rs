//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! memory usage.

use serde::Serialize;

use crate::cache::EvictionStrategy;

// == Cache Stats ==
/// Snapshot of a pool's performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// hits / (hits + misses), 0.0 before any lookup
    pub hit_rate: f64,
    /// Number of live entries evicted for capacity
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Number of entries removed by dependency or pattern invalidation
    pub invalidations: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Sum of entry sizes in bytes
    pub memory_usage: usize,
    /// Age of the oldest entry in milliseconds, 0 when empty
    pub oldest_entry_age_ms: u64,
    /// Entry budget
    pub max_entries: usize,
    /// Byte budget
    pub max_bytes: usize,
    /// Eviction strategy in use
    pub strategy: EvictionStrategy,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total number of lookups served.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of the byte budget in use.
    pub fn memory_ratio(&self) -> f64 {
        if self.max_bytes == 0 {
            0.0
        } else {
            self.memory_usage as f64 / self.max_bytes as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.hit_rate = self.hit_rate();
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.hit_rate = self.hit_rate();
    }

    // == Record Removals ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Adds expired-entry removals.
    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    /// Adds invalidated-entry removals.
    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }
}

//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with strategy-driven eviction,
//! TTL expiration, dependency tags and byte accounting.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::cache::codec::{estimate_size, Codec};
use crate::cache::{AdaptiveTuning, CacheEntry, CacheStats, EvictionStrategy};
use crate::clock::{duration_ms, system_clock, Clock};
use crate::config::PoolConfig;

// == Set Options ==
/// Per-entry options for [`CacheStore::set`].
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// TTL override; the pool default applies when absent
    pub ttl: Option<Duration>,
    /// Dependency tags for bulk invalidation
    pub dependencies: Vec<String>,
    /// Size in bytes; estimated from the serialized value when absent
    pub size_hint: Option<usize>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn depends_on(mut self, tag: impl Into<String>) -> Self {
        self.dependencies.push(tag.into());
        self
    }

    pub fn size_hint(mut self, bytes: usize) -> Self {
        self.size_hint = Some(bytes);
        self
    }
}

// == Cache Store ==
/// Bounded key-value store with pluggable eviction and TTL support.
///
/// After every mutating call `len() <= max_entries` and
/// `memory_usage() <= max_bytes`. Room is made before a new entry is
/// admitted, so callers never observe an overshoot.
pub struct CacheStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Budgets, default TTL and strategy
    config: PoolConfig,
    /// Constants for the adaptive TTL extension
    tuning: AdaptiveTuning,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Measures entry sizes; the JSON form is measured when unset
    codec: Option<Arc<dyn Codec<T>>>,
    /// Performance statistics
    stats: CacheStats,
    /// Sum of entry sizes
    memory_usage: usize,
    /// Monotonic touch counter
    sequence: u64,
}

impl<T> CacheStore<T> {
    // == Constructor ==
    /// Creates a new CacheStore driven by the wall clock.
    pub fn new(config: PoolConfig) -> Self {
        Self::with_clock(config, system_clock())
    }

    /// Creates a new CacheStore with an explicit time source.
    pub fn with_clock(config: PoolConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            tuning: AdaptiveTuning::default(),
            clock,
            codec: None,
            stats: CacheStats::new(),
            memory_usage: 0,
            sequence: 0,
        }
    }

    /// Sizes entries with `codec` instead of their JSON form.
    pub fn with_codec(mut self, codec: Arc<dyn Codec<T>>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Replaces the adaptive tuning constants.
    pub fn with_tuning(mut self, tuning: AdaptiveTuning) -> Self {
        self.tuning = tuning;
        self
    }

    // == Delete ==
    /// Removes an entry by key. Returns true if it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.memory_usage -= entry.size_bytes;
                true
            }
            None => false,
        }
    }

    /// Returns true if a live entry exists, without touching stats or recency.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    // == Invalidation ==
    /// Removes every entry tagged with `tag`. Returns the number removed.
    pub fn invalidate_by_dependency(&mut self, tag: &str) -> usize {
        let removed = self.remove_where(|_, entry| entry.depends_on(tag));
        self.stats.record_invalidations(removed);
        if removed > 0 {
            debug!("Invalidated {} entries depending on '{}'", removed, tag);
        }
        removed
    }

    /// Removes every entry whose key matches `predicate`.
    pub fn invalidate_by_pattern<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let removed = self.remove_where(|key, _| predicate(key));
        self.stats.record_invalidations(removed);
        removed
    }

    /// Removes every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        self.invalidate_by_pattern(|key| key.starts_with(prefix))
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        self.purge_expired(now)
    }

    // == Optimize ==
    /// Extends the TTL of entries hit well above the pool mean.
    ///
    /// Only adaptive pools are tuned. Returns the number of entries extended.
    pub fn optimize(&mut self) -> usize {
        if self.config.strategy != EvictionStrategy::Adaptive || self.entries.is_empty() {
            return 0;
        }

        let total_hits: u64 = self.entries.values().map(|e| e.access_count).sum();
        let mean = total_hits as f64 / self.entries.len() as f64;
        let threshold = mean * self.tuning.hot_factor;
        let cap = self
            .config
            .default_ttl_ms
            .saturating_mul(self.tuning.max_ttl_multiplier);

        let mut extended = 0;
        for entry in self.entries.values_mut() {
            let hot = entry.access_count >= self.tuning.min_hits
                && entry.access_count as f64 > threshold;
            if hot && entry.ttl_ms < cap {
                let grown = (entry.ttl_ms as f64 * self.tuning.extension_factor) as u64;
                entry.ttl_ms = grown.max(entry.ttl_ms + 1).min(cap);
                extended += 1;
            }
        }

        if extended > 0 {
            debug!("Adaptive pass extended TTL of {} hot entries", extended);
        }
        extended
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.memory_usage = 0;
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats.memory_usage = self.memory_usage;
        stats.oldest_entry_age_ms = self
            .entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.age_ms(now))
            .max()
            .unwrap_or(0);
        stats.max_entries = self.config.max_entries;
        stats.max_bytes = self.config.max_bytes;
        stats.strategy = self.config.strategy;
        stats
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of entry sizes in bytes.
    pub fn memory_usage(&self) -> usize {
        self.memory_usage
    }

    /// Keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Metadata for a key, expired or not. Used for diagnostics.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    // == Internals ==
    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&str, &CacheEntry<T>) -> bool,
    {
        let before = self.entries.len();
        let mut freed = 0;
        self.entries.retain(|key, entry| {
            if predicate(key, entry) {
                freed += entry.size_bytes;
                false
            } else {
                true
            }
        });
        self.memory_usage -= freed;
        before - self.entries.len()
    }

    fn purge_expired(&mut self, now: u64) -> usize {
        let removed = self.remove_where(|_, entry| entry.is_expired(now));
        self.stats.record_expirations(removed);
        removed
    }

    fn over_budget(&self, incoming_bytes: usize) -> bool {
        self.entries.len() + 1 > self.config.max_entries
            || self.memory_usage + incoming_bytes > self.config.max_bytes
    }

    /// Frees space for an entry of `incoming_bytes`: expired entries go
    /// first, then strategy-chosen victims.
    fn make_room(&mut self, incoming_bytes: usize, now: u64) {
        if !self.over_budget(incoming_bytes) {
            return;
        }
        self.purge_expired(now);

        while self.over_budget(incoming_bytes) {
            let victim = self
                .config
                .strategy
                .select_victim(self.entries.iter(), now);
            match victim {
                Some(key) => {
                    self.delete(&key);
                    self.stats.record_eviction();
                    debug!("Evicted '{}' ({} strategy)", key, self.config.strategy);
                }
                None => break,
            }
        }
    }
}

impl<T: Clone> CacheStore<T> {
    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired. Expired entries are
    /// removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.delete(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        let sequence = self.next_sequence();
        let entry = self.entries.get_mut(key)?;
        entry.touch(now, sequence);
        self.stats.record_hit();
        Some(entry.value.clone())
    }
}

impl<T: Serialize> CacheStore<T> {
    // == Set ==
    /// Stores a value, evicting as needed to stay within budget.
    ///
    /// An existing entry under the same key is replaced and its bytes are
    /// released before the budget check. Returns false, leaving the pool
    /// untouched, when the entry alone exceeds the byte budget.
    pub fn set(&mut self, key: impl Into<String>, value: T, options: SetOptions) -> bool {
        let key = key.into();
        let size = options
            .size_hint
            .unwrap_or_else(|| self.entry_size(&value));

        if size > self.config.max_bytes || self.config.max_entries == 0 {
            debug!(
                "Rejected '{}': {} bytes exceeds pool budget of {} bytes",
                key, size, self.config.max_bytes
            );
            return false;
        }

        let now = self.clock.now_ms();
        self.delete(&key);
        self.make_room(size, now);

        let ttl_ms = options
            .ttl
            .map(duration_ms)
            .unwrap_or(self.config.default_ttl_ms);
        let sequence = self.next_sequence();
        let entry = CacheEntry::new(value, now, ttl_ms, size)
            .with_dependencies(options.dependencies)
            .with_sequence(sequence);

        self.memory_usage += size;
        self.entries.insert(key, entry);
        true
    }

    fn entry_size(&self, value: &T) -> usize {
        match &self.codec {
            Some(codec) => codec.encoded_len(value).unwrap_or_else(|e| {
                debug!("Codec '{}' could not size value: {}", codec.name(), e);
                estimate_size(value)
            }),
            None => estimate_size(value),
        }
    }
}

impl<T> fmt::Debug for CacheStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("config", &self.config)
            .field("entries", &self.entries.len())
            .field("memory_usage", &self.memory_usage)
            .field("codec", &self.codec.as_ref().map(|codec| codec.name()))
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

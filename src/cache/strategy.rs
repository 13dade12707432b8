//! Eviction Strategy Module
//!
//! Chooses which entry leaves a pool when admitting a new one would exceed
//! its budget.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::CacheEntry;

// == Eviction Strategy ==
/// Policy used to pick an eviction victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Smallest `last_accessed_at`
    #[default]
    Lru,
    /// Smallest `access_count`
    Lfu,
    /// Soonest `created_at + ttl`
    Ttl,
    /// Smallest heuristic score, see [`adaptive_score`]
    Adaptive,
}

impl EvictionStrategy {
    /// Lowercase name used in configuration and stats.
    pub fn name(&self) -> &'static str {
        match self {
            EvictionStrategy::Lru => "lru",
            EvictionStrategy::Lfu => "lfu",
            EvictionStrategy::Ttl => "ttl",
            EvictionStrategy::Adaptive => "adaptive",
        }
    }

    /// Orders two entries by eviction priority. `Less` means `a` goes first.
    ///
    /// Ties fall back to the touch sequence so selection is deterministic
    /// even when timestamps collide within one millisecond.
    pub fn compare<T>(&self, a: &CacheEntry<T>, b: &CacheEntry<T>, now: u64) -> Ordering {
        let primary = match self {
            EvictionStrategy::Lru => a.last_accessed_at.cmp(&b.last_accessed_at),
            EvictionStrategy::Lfu => a.access_count.cmp(&b.access_count),
            EvictionStrategy::Ttl => a.expires_at().cmp(&b.expires_at()),
            EvictionStrategy::Adaptive => adaptive_score(a, now)
                .partial_cmp(&adaptive_score(b, now))
                .unwrap_or(Ordering::Equal),
        };
        primary.then_with(|| a.sequence.cmp(&b.sequence))
    }

    // == Select Victim ==
    /// Returns the key of the entry this strategy evicts first.
    pub fn select_victim<'a, T, I>(&self, entries: I, now: u64) -> Option<String>
    where
        T: 'a,
        I: IntoIterator<Item = (&'a String, &'a CacheEntry<T>)>,
    {
        entries
            .into_iter()
            .min_by(|(_, a), (_, b)| self.compare(a, b, now))
            .map(|(key, _)| key.clone())
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EvictionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionStrategy::Lru),
            "lfu" => Ok(EvictionStrategy::Lfu),
            "ttl" => Ok(EvictionStrategy::Ttl),
            "adaptive" => Ok(EvictionStrategy::Adaptive),
            other => Err(format!("unknown eviction strategy: {}", other)),
        }
    }
}

// == Adaptive Score ==
/// Heuristic retention score; lower scores are evicted first.
///
/// `(hits / age) * (remaining_ttl / ttl) * (1 / idle)`, with every divisor
/// clamped to at least one millisecond. Frequently hit, fresh, recently used
/// entries score high. This is a tuning heuristic, not an optimal policy.
pub fn adaptive_score<T>(entry: &CacheEntry<T>, now: u64) -> f64 {
    let age = entry.age_ms(now).max(1) as f64;
    let ttl = entry.ttl_ms.max(1) as f64;
    let remaining = entry.ttl_remaining_ms(now) as f64;
    let idle = entry.idle_ms(now).max(1) as f64;

    (entry.access_count as f64 / age) * (remaining / ttl) * (1.0 / idle)
}

// == Adaptive Tuning ==
/// Constants for the "keep what's hot" TTL extension pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveTuning {
    /// Entries above `mean * hot_factor` hits count as hot
    pub hot_factor: f64,
    /// Hot entries need at least this many hits
    pub min_hits: u64,
    /// TTL multiplier applied per pass
    pub extension_factor: f64,
    /// TTL never grows past `default_ttl * max_ttl_multiplier`
    pub max_ttl_multiplier: u64,
}

impl Default for AdaptiveTuning {
    fn default() -> Self {
        Self {
            hot_factor: 2.0,
            min_hits: 2,
            extension_factor: 1.5,
            max_ttl_multiplier: 4,
        }
    }
}

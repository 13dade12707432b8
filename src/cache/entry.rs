//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL, access
//! tracking and dependency tags.

use std::collections::BTreeSet;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// All timestamps are Unix milliseconds taken from the owning store's clock.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Creation timestamp
    pub created_at: u64,
    /// Time-to-live in milliseconds
    pub ttl_ms: u64,
    /// Number of hits served from this entry
    pub access_count: u64,
    /// Timestamp of the last hit (or creation)
    pub last_accessed_at: u64,
    /// Store-wide touch order, used to break ties between equal timestamps
    pub sequence: u64,
    /// Estimated size of the value in bytes
    pub size_bytes: usize,
    /// Dependency tags used for bulk invalidation
    pub dependencies: BTreeSet<String>,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `now` - Creation time
    /// * `ttl_ms` - Time-to-live in milliseconds
    /// * `size_bytes` - Size accounted against the pool budget
    pub fn new(value: T, now: u64, ttl_ms: u64, size_bytes: usize) -> Self {
        Self {
            value,
            created_at: now,
            ttl_ms,
            access_count: 0,
            last_accessed_at: now,
            sequence: 0,
            size_bytes,
            dependencies: BTreeSet::new(),
        }
    }

    /// Attaches dependency tags.
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the touch-order sequence number.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is live while `now - created_at <= ttl`; it expires strictly
    /// after the TTL has fully elapsed.
    pub fn is_expired(&self, now: u64) -> bool {
        self.age_ms(now) > self.ttl_ms
    }

    /// Absolute expiration timestamp.
    pub fn expires_at(&self) -> u64 {
        self.created_at.saturating_add(self.ttl_ms)
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.expires_at().saturating_sub(now)
    }

    /// Milliseconds since creation.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    /// Milliseconds since the last access.
    pub fn idle_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_accessed_at)
    }

    // == Touch ==
    /// Records a hit.
    pub fn touch(&mut self, now: u64, sequence: u64) {
        self.access_count += 1;
        // Keeps last_accessed_at >= created_at even if the clock steps back.
        self.last_accessed_at = now.max(self.created_at);
        self.sequence = sequence;
    }

    /// Returns true if the entry carries the given dependency tag.
    pub fn depends_on(&self, tag: &str) -> bool {
        self.dependencies.contains(tag)
    }
}

//! Cache Module
//!
//! Provides bounded in-memory caching with TTL expiration, pluggable eviction
//! strategies, dependency invalidation and function memoization.

pub mod codec;
mod entry;
mod memo;
mod pool;
mod stats;
mod store;
mod strategy;


// Re-export public types
pub use codec::{Codec, CodecError, JsonCodec};
pub use entry::CacheEntry;
pub use memo::{memo_key, Memoizer};
pub use pool::{CachePool, PoolMaintenance};
pub use stats::CacheStats;
pub use store::{CacheStore, SetOptions};
pub use strategy::{adaptive_score, AdaptiveTuning, EvictionStrategy};

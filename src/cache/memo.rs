//! Memoizer Module
//!
//! Wraps a deterministic function with a cache pool keyed by the canonical
//! JSON serialization of its arguments.

use std::marker::PhantomData;

use serde::Serialize;
use tracing::warn;

use crate::cache::{CachePool, CacheStats, CacheStore, SetOptions};
use crate::config::PoolConfig;

// == Memoizer ==
/// Caches `func(args)` by value-equal arguments.
///
/// Argument order matters: `(1, 2)` and `(2, 1)` are distinct keys. Callers
/// must pass arguments whose serialization is canonical (no `HashMap`s) and
/// must only wrap deterministic functions.
pub struct Memoizer<A: ?Sized, R, F> {
    func: F,
    pool: CachePool<R>,
    _args: PhantomData<fn(&A)>,
}

impl<A, R, F> Memoizer<A, R, F>
where
    A: Serialize + ?Sized,
    R: Clone + Serialize,
    F: Fn(&A) -> R,
{
    /// Creates a memoizer backed by a fresh store.
    pub fn new(func: F, config: PoolConfig) -> Self {
        Self::with_store(func, CacheStore::new(config))
    }

    /// Creates a memoizer backed by the given store.
    pub fn with_store(func: F, store: CacheStore<R>) -> Self {
        Self {
            func,
            pool: CachePool::new("memo", store),
            _args: PhantomData,
        }
    }

    // == Call ==
    /// Returns the cached result for `args`, computing it on a miss.
    ///
    /// Arguments that cannot be serialized bypass the cache.
    pub fn call(&self, args: &A) -> R {
        let key = match memo_key(args) {
            Some(key) => key,
            None => {
                warn!("Memoizer arguments are not serializable; bypassing cache");
                return (self.func)(args);
            }
        };

        if let Some(result) = self.pool.get(&key) {
            return result;
        }

        // Computed outside the pool lock so `func` may be slow or re-entrant.
        let result = (self.func)(args);
        self.pool.set(key, result.clone(), SetOptions::new());
        result
    }

    /// Drops the cached result for `args`. Returns true if one existed.
    pub fn invalidate(&self, args: &A) -> bool {
        memo_key(args)
            .map(|key| self.pool.delete(&key))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        self.pool.clear()
    }

    pub fn stats(&self) -> CacheStats {
        self.pool.stats()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

/// Canonical cache key for a set of arguments.
pub fn memo_key<A: Serialize + ?Sized>(args: &A) -> Option<String> {
    serde_json::to_string(args).ok()
}

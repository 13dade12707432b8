//! Cache Pool Module
//!
//! Named, thread-safe wrapper around a [`CacheStore`]. Each pool is owned by
//! one subsystem; operations on a pool are serialized by its mutex.

use parking_lot::Mutex;
use serde::Serialize;

use crate::cache::{CacheStats, CacheStore, SetOptions};

// == Pool Maintenance ==
/// Type-erased view of a pool used by the background tick and diagnostics.
pub trait PoolMaintenance: Send + Sync {
    /// Pool name.
    fn name(&self) -> &str;

    /// Removes expired entries. Returns the number removed.
    fn cleanup(&self) -> usize;

    /// Runs the adaptive TTL pass. Returns the number of entries extended.
    fn optimize(&self) -> usize;

    /// Removes entries tagged with `tag`.
    fn invalidate_by_dependency(&self, tag: &str) -> usize;

    /// Current statistics.
    fn stats(&self) -> CacheStats;
}

// == Cache Pool ==
/// A named cache store behind a mutex.
#[derive(Debug)]
pub struct CachePool<T> {
    name: String,
    store: Mutex<CacheStore<T>>,
}

impl<T> CachePool<T> {
    /// Wraps a store under the given name.
    pub fn new(name: impl Into<String>, store: CacheStore<T>) -> Self {
        Self {
            name: name.into(),
            store: Mutex::new(store),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invalidate_by_dependency(&self, tag: &str) -> usize {
        self.store.lock().invalidate_by_dependency(tag)
    }

    pub fn invalidate_by_pattern<F>(&self, predicate: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        self.store.lock().invalidate_by_pattern(predicate)
    }

    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.store.lock().invalidate_prefix(prefix)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.store.lock().delete(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.lock().contains(key)
    }

    pub fn cleanup(&self) -> usize {
        self.store.lock().cleanup()
    }

    pub fn optimize(&self) -> usize {
        self.store.lock().optimize()
    }

    pub fn clear(&self) {
        self.store.lock().clear()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// Runs `f` with exclusive access to the underlying store.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut CacheStore<T>) -> R) -> R {
        f(&mut self.store.lock())
    }
}

impl<T: Clone> CachePool<T> {
    pub fn get(&self, key: &str) -> Option<T> {
        self.store.lock().get(key)
    }
}

impl<T: Serialize> CachePool<T> {
    pub fn set(&self, key: impl Into<String>, value: T, options: SetOptions) -> bool {
        self.store.lock().set(key, value, options)
    }
}

impl<T: Send> PoolMaintenance for CachePool<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn cleanup(&self) -> usize {
        CachePool::cleanup(self)
    }

    fn optimize(&self) -> usize {
        CachePool::optimize(self)
    }

    fn invalidate_by_dependency(&self, tag: &str) -> usize {
        CachePool::invalidate_by_dependency(self, tag)
    }

    fn stats(&self) -> CacheStats {
        CachePool::stats(self)
    }
}

//! Configuration Module
//!
//! Handles loading and managing pool, scheduler and server configuration
//! from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::EvictionStrategy;
use crate::clock::duration_ms;

/// Byte budget applied when a pool does not set one.
pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

// == Pool Config ==
/// Budget, default TTL and eviction strategy of one cache pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of entries the pool can hold
    pub max_entries: usize,
    /// Maximum sum of entry sizes in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// Eviction policy
    #[serde(default)]
    pub strategy: EvictionStrategy,
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_BYTES
}

impl PoolConfig {
    /// Creates an LRU pool config with the default byte budget.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            max_entries,
            max_bytes: DEFAULT_MAX_BYTES,
            default_ttl_ms: duration_ms(default_ttl),
            strategy: EvictionStrategy::Lru,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_strategy(mut self, strategy: EvictionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Loads a pool config from `{PREFIX}_CACHE_*` variables, falling back
    /// to `defaults` field by field.
    ///
    /// # Environment Variables
    /// - `{PREFIX}_CACHE_MAX_ENTRIES`
    /// - `{PREFIX}_CACHE_MAX_BYTES`
    /// - `{PREFIX}_CACHE_TTL_MS`
    /// - `{PREFIX}_CACHE_STRATEGY` - `lru`, `lfu`, `ttl` or `adaptive`
    pub fn from_env(prefix: &str, defaults: PoolConfig) -> Self {
        Self {
            max_entries: env_or(&format!("{}_CACHE_MAX_ENTRIES", prefix), defaults.max_entries),
            max_bytes: env_or(&format!("{}_CACHE_MAX_BYTES", prefix), defaults.max_bytes),
            default_ttl_ms: env_or(&format!("{}_CACHE_TTL_MS", prefix), defaults.default_ttl_ms),
            strategy: env_or(&format!("{}_CACHE_STRATEGY", prefix), defaults.strategy),
        }
    }

    /// Search-stage pool defaults.
    pub fn search_defaults() -> Self {
        PoolConfig::new(100, Duration::from_secs(300)).with_strategy(EvictionStrategy::Adaptive)
    }

    /// Filter-stage pool defaults.
    pub fn filter_defaults() -> Self {
        PoolConfig::new(200, Duration::from_secs(300))
    }

    /// Composite result pool defaults.
    pub fn result_defaults() -> Self {
        PoolConfig::new(50, Duration::from_secs(600))
            .with_max_bytes(10 * 1024 * 1024)
            .with_strategy(EvictionStrategy::Adaptive)
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Search-stage pool
    pub search_pool: PoolConfig,
    /// Filter-stage pool
    pub filter_pool: PoolConfig,
    /// Composite result pool
    pub result_pool: PoolConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Background maintenance interval in seconds
    pub cleanup_interval: u64,
    /// Quiet period before a live query recomputes, in milliseconds
    pub debounce_ms: u64,
    /// Samples retained per operation
    pub sample_capacity: usize,
    /// Item count above which search is offloaded to the compute backend
    pub offload_threshold: usize,
    /// Offloaded compute timeout in milliseconds
    pub compute_timeout_ms: u64,
    /// Optional JSON file with the initial item list
    pub items_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SEARCH_CACHE_*`, `FILTER_CACHE_*`, `RESULT_CACHE_*` - see [`PoolConfig::from_env`]
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Maintenance frequency in seconds (default: 5)
    /// - `DEBOUNCE_MS` - Live query debounce delay (default: 300)
    /// - `SAMPLE_CAPACITY` - Samples kept per operation (default: 100)
    /// - `OFFLOAD_THRESHOLD` - Items before search is offloaded (default: 5000)
    /// - `COMPUTE_TIMEOUT_MS` - Offloaded search timeout (default: 10000)
    /// - `ITEMS_PATH` - Initial item list (default: none)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            search_pool: PoolConfig::from_env("SEARCH", defaults.search_pool),
            filter_pool: PoolConfig::from_env("FILTER", defaults.filter_pool),
            result_pool: PoolConfig::from_env("RESULT", defaults.result_pool),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            debounce_ms: env_or("DEBOUNCE_MS", defaults.debounce_ms),
            sample_capacity: env_or("SAMPLE_CAPACITY", defaults.sample_capacity),
            offload_threshold: env_or("OFFLOAD_THRESHOLD", defaults.offload_threshold),
            compute_timeout_ms: env_or("COMPUTE_TIMEOUT_MS", defaults.compute_timeout_ms),
            items_path: env::var("ITEMS_PATH").ok().map(PathBuf::from),
        }
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn compute_timeout(&self) -> Duration {
        Duration::from_millis(self.compute_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_pool: PoolConfig::search_defaults(),
            filter_pool: PoolConfig::filter_defaults(),
            result_pool: PoolConfig::result_defaults(),
            server_port: 3000,
            cleanup_interval: 5,
            debounce_ms: 300,
            sample_capacity: 100,
            offload_threshold: 5_000,
            compute_timeout_ms: 10_000,
            items_path: None,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 5);
        assert_eq!(config.debounce_delay(), Duration::from_millis(300));
        assert_eq!(config.search_pool.strategy, EvictionStrategy::Adaptive);
        assert_eq!(config.filter_pool.strategy, EvictionStrategy::Lru);
        assert_eq!(config.result_pool.max_bytes, 10 * 1024 * 1024);
        assert!(config.items_path.is_none());
    }

    #[test]
    fn test_pool_config_from_env_overrides() {
        env::set_var("TESTPOOL_CACHE_MAX_ENTRIES", "7");
        env::set_var("TESTPOOL_CACHE_STRATEGY", "lfu");
        env::set_var("TESTPOOL_CACHE_TTL_MS", "not-a-number");

        let config = PoolConfig::from_env("TESTPOOL", PoolConfig::filter_defaults());
        assert_eq!(config.max_entries, 7);
        assert_eq!(config.strategy, EvictionStrategy::Lfu);
        // Unparseable values fall back to the default
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.max_bytes, DEFAULT_MAX_BYTES);

        env::remove_var("TESTPOOL_CACHE_MAX_ENTRIES");
        env::remove_var("TESTPOOL_CACHE_STRATEGY");
        env::remove_var("TESTPOOL_CACHE_TTL_MS");
    }

    #[test]
    fn test_pool_config_deserialize_with_defaults() {
        let json = r#"{"max_entries": 10, "default_ttl_ms": 1000}"#;
        let config: PoolConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_bytes, DEFAULT_MAX_BYTES);
        assert_eq!(config.strategy, EvictionStrategy::Lru);
        assert_eq!(config.default_ttl(), Duration::from_secs(1));
    }
}

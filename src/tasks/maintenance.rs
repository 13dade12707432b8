//! Cache Maintenance Task
//!
//! Background task that periodically removes expired entries and runs the
//! adaptive TTL pass on every cache pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::PoolMaintenance;

/// Totals of one maintenance tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceSummary {
    /// Expired entries removed
    pub removed: usize,
    /// Entries whose TTL was extended
    pub extended: usize,
}

/// Runs cleanup and optimization once over `pools`.
///
/// Each pool is locked only for its own pass, so a tick never holds more
/// than one pool at a time.
pub fn run_maintenance(pools: &[Arc<dyn PoolMaintenance>]) -> MaintenanceSummary {
    let mut summary = MaintenanceSummary::default();

    for pool in pools {
        let removed = pool.cleanup();
        let extended = pool.optimize();
        if removed > 0 || extended > 0 {
            debug!(
                "Pool '{}': removed {} expired, extended {} hot entries",
                pool.name(),
                removed,
                extended
            );
        }
        summary.removed += removed;
        summary.extended += extended;
    }

    summary
}

/// Spawns a background task that maintains `pools` every `interval`.
///
/// Returns the JoinHandle so the task can be aborted during graceful
/// shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_maintenance_task(pipeline.pools(), Duration::from_secs(5));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_maintenance_task(
    pools: Vec<Arc<dyn PoolMaintenance>>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache maintenance task for {} pools with interval of {:?}",
            pools.len(),
            interval
        );

        loop {
            tokio::time::sleep(interval).await;

            let summary = run_maintenance(&pools);

            if summary.removed > 0 {
                info!(
                    "Cache maintenance: removed {} expired entries, extended {}",
                    summary.removed, summary.extended
                );
            } else {
                debug!(
                    "Cache maintenance: no expired entries, extended {}",
                    summary.extended
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CachePool, CacheStore, EvictionStrategy, SetOptions};
    use crate::clock::ManualClock;
    use crate::config::PoolConfig;

    fn pool(name: &str, clock: &ManualClock, strategy: EvictionStrategy) -> Arc<CachePool<String>> {
        let config = PoolConfig::new(100, Duration::from_secs(60)).with_strategy(strategy);
        Arc::new(CachePool::new(
            name,
            CacheStore::with_clock(config, Arc::new(clock.clone())),
        ))
    }

    #[test]
    fn test_run_maintenance_removes_expired_across_pools() {
        let clock = ManualClock::new(0);
        let search = pool("search", &clock, EvictionStrategy::Lru);
        let results = pool("results", &clock, EvictionStrategy::Lru);

        search.set("short", "v".into(), SetOptions::new().ttl(Duration::from_secs(1)));
        search.set("long", "v".into(), SetOptions::new());
        results.set("short", "v".into(), SetOptions::new().ttl(Duration::from_secs(1)));

        clock.advance(Duration::from_secs(2));
        let pools: Vec<Arc<dyn PoolMaintenance>> = vec![search.clone(), results.clone()];
        let summary = run_maintenance(&pools);

        assert_eq!(summary.removed, 2);
        assert!(search.contains("long"));
        assert!(results.is_empty());
    }

    #[test]
    fn test_run_maintenance_extends_hot_adaptive_entries() {
        let clock = ManualClock::new(0);
        let adaptive = pool("adaptive", &clock, EvictionStrategy::Adaptive);
        for key in ["hot", "cold1", "cold2"] {
            adaptive.set(key, "v".into(), SetOptions::new());
        }
        for _ in 0..10 {
            adaptive.get("hot");
        }

        let pools: Vec<Arc<dyn PoolMaintenance>> = vec![adaptive.clone()];
        let summary = run_maintenance(&pools);

        assert_eq!(summary, MaintenanceSummary { removed: 0, extended: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_maintenance_task_runs_each_interval() {
        let clock = ManualClock::new(0);
        let search = pool("search", &clock, EvictionStrategy::Lru);
        search.set("a", "v".into(), SetOptions::new().ttl(Duration::from_secs(1)));
        search.set("b", "v".into(), SetOptions::new().ttl(Duration::from_secs(3600)));

        let pools: Vec<Arc<dyn PoolMaintenance>> = vec![search.clone()];
        let handle = spawn_maintenance_task(pools, Duration::from_secs(5));

        clock.advance(Duration::from_secs(2));
        tokio::time::sleep(Duration::from_millis(5_500)).await;

        assert!(!search.contains("a"), "Expired entry should have been cleaned up");
        assert!(search.contains("b"), "Valid entry should not be removed");
        assert_eq!(search.stats().expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_maintenance_task_can_be_aborted() {
        let handle = spawn_maintenance_task(Vec::new(), Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}

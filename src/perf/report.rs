//! Performance Report
//!
//! Combines operation timings with cache pool statistics and derives
//! advisory recommendations. Nothing here is enforced automatically.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheStats, PoolMaintenance};
use crate::perf::{OperationStats, PerformanceSampler};

// == Thresholds ==
/// Limits that trigger a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thresholds {
    /// Average operation time above which lazy loading is suggested
    pub slow_average_ms: f64,
    /// p95 above which offloading is suggested
    pub slow_p95_ms: f64,
    /// Hit rate below which a larger TTL or capacity is suggested
    pub min_hit_rate: f64,
    /// Lookups a pool needs before its hit rate is judged
    pub min_lookups: u64,
    /// Share of the byte budget above which memory pressure is reported
    pub max_memory_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            slow_average_ms: 100.0,
            slow_p95_ms: 500.0,
            min_hit_rate: 0.7,
            min_lookups: 10,
            max_memory_ratio: 0.8,
        }
    }
}

// == General Stats ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralStats {
    /// Distinct operations sampled
    pub total_operations: usize,
    /// Samples across all operations
    pub total_samples: usize,
    /// Sample-weighted mean duration
    pub average_ms: f64,
    /// Operation with the highest average
    pub slowest_operation: Option<String>,
}

impl GeneralStats {
    fn from_detailed(detailed: &BTreeMap<String, OperationStats>) -> Self {
        let total_samples: usize = detailed.values().map(|s| s.count).sum();
        let weighted: f64 = detailed.values().map(|s| s.average * s.count as f64).sum();
        let slowest_operation = detailed
            .iter()
            .max_by(|(_, a), (_, b)| a.average.total_cmp(&b.average))
            .map(|(name, _)| name.clone());

        Self {
            total_operations: detailed.len(),
            total_samples,
            average_ms: if total_samples == 0 {
                0.0
            } else {
                weighted / total_samples as f64
            },
            slowest_operation,
        }
    }
}

// == Performance Report ==
/// Diagnostics snapshot for an operational dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub general_stats: GeneralStats,
    pub detailed_stats: BTreeMap<String, OperationStats>,
    pub cache_stats: BTreeMap<String, CacheStats>,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl PerformanceReport {
    /// Builds a report from the sampler and the given pools.
    pub fn build(
        sampler: &PerformanceSampler,
        pools: &[Arc<dyn PoolMaintenance>],
        thresholds: &Thresholds,
    ) -> Self {
        let detailed_stats = sampler.get_all_stats();
        let cache_stats: BTreeMap<String, CacheStats> = pools
            .iter()
            .map(|pool| (pool.name().to_string(), pool.stats()))
            .collect();
        let recommendations = recommendations(&detailed_stats, &cache_stats, thresholds);

        Self {
            general_stats: GeneralStats::from_detailed(&detailed_stats),
            detailed_stats,
            cache_stats,
            recommendations,
            generated_at: Utc::now(),
        }
    }
}

// == Recommendations ==
/// Compares aggregates against `thresholds` and returns advisory text.
pub fn recommendations(
    detailed: &BTreeMap<String, OperationStats>,
    cache_stats: &BTreeMap<String, CacheStats>,
    thresholds: &Thresholds,
) -> Vec<String> {
    let mut out = Vec::new();

    for (operation, stats) in detailed {
        if stats.average > thresholds.slow_average_ms {
            out.push(format!(
                "'{}' averages {:.1} ms; consider lazy loading or paginating its input",
                operation, stats.average
            ));
        }
        if stats.p95 > thresholds.slow_p95_ms {
            out.push(format!(
                "'{}' p95 is {:.1} ms; consider offloading it to a background worker",
                operation, stats.p95
            ));
        }
    }

    for (pool, stats) in cache_stats {
        let lookups = stats.lookups();
        if lookups >= thresholds.min_lookups && stats.hit_rate() < thresholds.min_hit_rate {
            out.push(format!(
                "Pool '{}' hit rate is {:.0}%; consider increasing its TTL or capacity",
                pool,
                stats.hit_rate() * 100.0
            ));
        }
        if stats.memory_ratio() > thresholds.max_memory_ratio {
            out.push(format!(
                "Pool '{}' uses {:.0}% of its byte budget; consider raising max_bytes or shortening TTL",
                pool,
                stats.memory_ratio() * 100.0
            ));
        }
        if lookups >= thresholds.min_lookups && stats.evictions > lookups / 2 {
            out.push(format!(
                "Pool '{}' evicted {} entries over {} lookups; it is thrashing",
                pool, stats.evictions, lookups
            ));
        }
    }

    out
}

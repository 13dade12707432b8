//! Performance Sampler
//!
//! Records operation durations in a bounded ring per operation name and
//! aggregates them on demand.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Samples retained per operation unless configured otherwise.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 100;

// == Performance Sample ==
/// One timed call.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSample {
    pub operation: String,
    pub duration_ms: f64,
    pub timestamp: DateTime<Utc>,
}

// == Operation Stats ==
/// Aggregate over the retained samples of one operation, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationStats {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub p95: f64,
    pub p99: f64,
}

impl OperationStats {
    /// Aggregates a set of durations. Returns `None` when empty.
    ///
    /// Percentiles use the nearest-rank method; the median of an even-sized
    /// set averages the two middle values.
    pub fn from_durations(durations: &[f64]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }

        let mut sorted = durations.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        Some(Self {
            count,
            average: sum / count as f64,
            min: sorted[0],
            max: sorted[count - 1],
            median,
            p95: nearest_rank(&sorted, 95.0),
            p99: nearest_rank(&sorted, 99.0),
        })
    }
}

fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    let rank = (percentile * sorted.len() as f64 / 100.0).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

// == Timer ==
/// Running measurement returned by [`PerformanceSampler::start_timing`].
#[must_use = "a timer records nothing until stopped"]
#[derive(Debug)]
pub struct Timer<'a> {
    sampler: &'a PerformanceSampler,
    operation: String,
    started: Instant,
}

impl Timer<'_> {
    /// Records the sample and returns the elapsed time.
    pub fn stop(self) -> Duration {
        let elapsed = self.started.elapsed();
        self.sampler.record(&self.operation, elapsed);
        elapsed
    }
}

// == Performance Sampler ==
/// Thread-safe rolling sample store.
#[derive(Debug)]
pub struct PerformanceSampler {
    capacity: usize,
    samples: Mutex<HashMap<String, VecDeque<PerformanceSample>>>,
}

impl Default for PerformanceSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_CAPACITY)
    }
}

impl PerformanceSampler {
    /// Creates a sampler keeping the last `capacity` samples per operation.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: Mutex::new(HashMap::new()),
        }
    }

    /// Starts timing `operation`.
    pub fn start_timing(&self, operation: impl Into<String>) -> Timer<'_> {
        Timer {
            sampler: self,
            operation: operation.into(),
            started: Instant::now(),
        }
    }

    /// Times a closure under `operation`.
    pub fn time<R>(&self, operation: &str, f: impl FnOnce() -> R) -> R {
        let timer = self.start_timing(operation);
        let result = f();
        timer.stop();
        result
    }

    // == Record ==
    /// Adds one sample, dropping the oldest once the ring is full.
    pub fn record(&self, operation: &str, duration: Duration) {
        let sample = PerformanceSample {
            operation: operation.to_string(),
            duration_ms: duration.as_secs_f64() * 1_000.0,
            timestamp: Utc::now(),
        };

        let mut samples = self.samples.lock();
        let ring = samples.entry(operation.to_string()).or_default();
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(sample);
    }

    // == Stats ==
    /// Aggregate for one operation, or `None` if it was never sampled.
    pub fn get_stats(&self, operation: &str) -> Option<OperationStats> {
        let samples = self.samples.lock();
        let durations: Vec<f64> = samples
            .get(operation)?
            .iter()
            .map(|s| s.duration_ms)
            .collect();
        OperationStats::from_durations(&durations)
    }

    /// Aggregates for every observed operation.
    pub fn get_all_stats(&self) -> BTreeMap<String, OperationStats> {
        let samples = self.samples.lock();
        samples
            .iter()
            .filter_map(|(operation, ring)| {
                let durations: Vec<f64> = ring.iter().map(|s| s.duration_ms).collect();
                OperationStats::from_durations(&durations).map(|stats| (operation.clone(), stats))
            })
            .collect()
    }

    /// Retained samples for one operation, oldest first.
    pub fn samples(&self, operation: &str) -> Vec<PerformanceSample> {
        self.samples
            .lock()
            .get(operation)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_over_known_durations() {
        let sampler = PerformanceSampler::new(100);
        for ms in 1..=100u64 {
            sampler.record("search", Duration::from_millis(ms));
        }

        let stats = sampler.get_stats("search").unwrap();
        assert_eq!(stats.count, 100);
        assert!((stats.average - 50.5).abs() < 1e-9);
        assert!((stats.min - 1.0).abs() < 1e-9);
        assert!((stats.max - 100.0).abs() < 1e-9);
        assert!((stats.median - 50.5).abs() < 1e-9);
        assert!((stats.p95 - 95.0).abs() < 1e-9);
        assert!((stats.p99 - 99.0).abs() < 1e-9);
    }

    #[test]
    fn test_odd_median_and_single_sample() {
        let stats = OperationStats::from_durations(&[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(stats.median, 2.0);

        let single = OperationStats::from_durations(&[7.0]).unwrap();
        assert_eq!(single.p95, 7.0);
        assert_eq!(single.p99, 7.0);
        assert!(OperationStats::from_durations(&[]).is_none());
    }

    #[test]
    fn test_ring_keeps_last_n_samples() {
        let sampler = PerformanceSampler::new(3);
        for ms in [10, 20, 30, 40, 50] {
            sampler.record("filter", Duration::from_millis(ms));
        }

        let stats = sampler.get_stats("filter").unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.min - 30.0).abs() < 1e-9);
        assert_eq!(sampler.samples("filter").len(), 3);
    }

    #[test]
    fn test_unknown_operation_has_no_stats() {
        let sampler = PerformanceSampler::default();
        assert!(sampler.get_stats("never").is_none());
        assert!(sampler.samples("never").is_empty());
    }

    #[test]
    fn test_timer_records_one_sample() {
        let sampler = PerformanceSampler::default();

        let timer = sampler.start_timing("group");
        std::thread::sleep(Duration::from_millis(5));
        let elapsed = timer.stop();

        assert!(elapsed >= Duration::from_millis(5));
        let samples = sampler.samples("group");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].operation, "group");
        assert!(samples[0].duration_ms >= 5.0);
    }

    #[test]
    fn test_time_closure_and_all_stats() {
        let sampler = PerformanceSampler::default();

        assert_eq!(sampler.time("sort", || 41 + 1), 42);
        sampler.record("search", Duration::from_millis(1));

        let all = sampler.get_all_stats();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["search", "sort"]);

        sampler.clear();
        assert!(sampler.get_all_stats().is_empty());
    }
}

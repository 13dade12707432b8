//! Performance Module
//!
//! Rolling timing samples per operation and the advisory report built from
//! them and from cache pool statistics.

mod report;
mod sampler;

pub use report::{GeneralStats, PerformanceReport, Thresholds};
pub use sampler::{
    OperationStats, PerformanceSample, PerformanceSampler, Timer, DEFAULT_SAMPLE_CAPACITY,
};

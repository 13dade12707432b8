//! Scheduler Module
//!
//! Deferred work that coalesces bursts of requests.
//!
//! # Components
//! - Debounce: per-key trailing-edge timers with reset-the-clock semantics

mod debounce;

pub use debounce::DebounceScheduler;

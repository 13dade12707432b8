//! apiscope - Adaptive caching and query layer for API descriptions
//!
//! Bounded cache pools with pluggable eviction, TTL expiry and dependency
//! invalidation, feeding a deterministic search/filter/sort/group pipeline.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod perf;
pub mod query;
pub mod scheduler;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use query::{QueryPipeline, QueryResult, QuerySpec};
pub use tasks::spawn_maintenance_task;

//! Query Module
//!
//! The search → filter → sort → group pipeline over API operations and the
//! types that describe a query.
//!
//! # Components
//! - Item / Schema: the input records produced by the document parser
//! - Spec: filter, sort and group specifications and their cache keys
//! - Stages: pure search, filter, sort and group functions
//! - Pipeline: stage caching and item-set replacement
//! - Compute: offloaded search boundary
//! - Live: debounced recomputation pushed to subscribers

mod compute;
pub mod filter;
pub mod group;
mod item;
mod live;
mod pipeline;
pub mod schema;
pub mod search;
pub mod sort;
mod spec;


// Re-export public types
pub use compute::{BlockingBackend, ComputeBackend};
pub use item::{ApiItem, Complexity, HttpMethod, ResponseTime};
pub use live::{LiveQuery, LiveUpdate};
pub use pipeline::{
    IndexedResult, QueryPipeline, QueryResult, DEFAULT_OFFLOAD_THRESHOLD, DEP_FILTERS,
    DEP_GROUPING, DEP_ITEMS, DEP_SORTING, FILTER_POOL, RESULT_POOL, SEARCH_POOL,
};
pub use schema::{PrimitiveType, Schema, SchemaMetrics, SchemaVisitor};
pub use search::SearchRequest;
pub use spec::{
    FilterSpec, GroupBy, GroupSpec, QuerySpec, SearchField, SortKey, SortOrder, SortSpec,
};

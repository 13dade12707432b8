//! API Handlers
//!
//! HTTP request handlers for each query service endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    HealthResponse, InvalidateResponse, ItemsRequest, ItemsResponse, QueryRequest, QueryResponse,
    StatsResponse,
};
use crate::perf::{PerformanceReport, PerformanceSampler, Thresholds};
use crate::query::{
    BlockingBackend, ComputeBackend, QueryPipeline, DEP_FILTERS, DEP_GROUPING, DEP_ITEMS,
    DEP_SORTING,
};
use crate::scheduler::DebounceScheduler;

/// Dependency tags a client may invalidate.
pub const KNOWN_TAGS: [&str; 4] = [DEP_ITEMS, DEP_FILTERS, DEP_SORTING, DEP_GROUPING];

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Query pipeline and its cache pools
    pub pipeline: Arc<QueryPipeline>,
    /// Collaborator for offloaded search
    pub backend: Arc<dyn ComputeBackend>,
    /// Timers for live queries, shared by every connection
    pub scheduler: DebounceScheduler,
    pub thresholds: Arc<Thresholds>,
    pub compute_timeout: Duration,
    pub debounce_delay: Duration,
    next_client: Arc<AtomicU64>,
}

impl AppState {
    /// Creates a new AppState around an existing pipeline.
    pub fn new(pipeline: Arc<QueryPipeline>, backend: Arc<dyn ComputeBackend>) -> Self {
        let defaults = Config::default();
        Self {
            pipeline,
            backend,
            scheduler: DebounceScheduler::new(),
            thresholds: Arc::new(Thresholds::default()),
            compute_timeout: defaults.compute_timeout(),
            debounce_delay: defaults.debounce_delay(),
            next_client: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the sampler and pipeline with the configured pool sizes and
    /// uses the in-process blocking backend for offloaded search.
    pub fn from_config(config: &Config) -> Self {
        let sampler = Arc::new(PerformanceSampler::new(config.sample_capacity));
        let pipeline = Arc::new(QueryPipeline::new(config, sampler));
        let mut state = Self::new(pipeline, Arc::new(BlockingBackend));
        state.compute_timeout = config.compute_timeout();
        state.debounce_delay = config.debounce_delay();
        state
    }

    /// Unique scheduler key for a new live connection.
    pub fn next_live_key(&self) -> String {
        format!("live:{}", self.next_client.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handler for PUT /items
///
/// Replaces the item set and invalidates every cached result derived from
/// the previous one.
pub async fn put_items_handler(
    State(state): State<AppState>,
    Json(req): Json<ItemsRequest>,
) -> Result<Json<ItemsResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let count = req.items.len();
    let generation = state.pipeline.set_items(req.items);

    Ok(Json(ItemsResponse::new(count, generation)))
}

/// Handler for POST /query
///
/// Runs the pipeline; large item sets are searched through the compute
/// backend and its failures are returned as errors.
pub async fn query_handler(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let started = Instant::now();
    let result = state
        .pipeline
        .run_offloaded(&req.spec, state.backend.as_ref(), state.compute_timeout)
        .await?;

    Ok(Json(QueryResponse {
        result,
        took_ms: started.elapsed().as_secs_f64() * 1_000.0,
    }))
}

/// Handler for POST /invalidate/:tag
///
/// Drops every cached entry depending on `tag` across all pools.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    if !KNOWN_TAGS.contains(&tag.as_str()) {
        return Err(AppError::NotFound(format!("Dependency tag '{}'", tag)));
    }

    let removed = state.pipeline.invalidate(&tag);
    info!("Invalidated {} entries tagged '{}' on request", removed, tag);

    Ok(Json(InvalidateResponse::new(tag, removed)))
}

/// Handler for GET /stats
///
/// Returns per-pool cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        items: state.pipeline.item_count(),
        generation: state.pipeline.generation(),
        pending_recomputations: state.scheduler.pending_count(),
        pools: state.pipeline.cache_stats(),
    })
}

/// Handler for GET /report
///
/// Returns operation timings, pool statistics and recommendations.
pub async fn report_handler(State(state): State<AppState>) -> Json<PerformanceReport> {
    Json(PerformanceReport::build(
        state.pipeline.sampler(),
        &state.pipeline.pools(),
        &state.thresholds,
    ))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ApiItem, FilterSpec, GroupBy, HttpMethod, QuerySpec};

    fn state() -> AppState {
        AppState::from_config(&Config::default())
    }

    fn items() -> Vec<ApiItem> {
        vec![
            ApiItem::new("a", HttpMethod::Get, "/pets").with_tags(["pets"]),
            ApiItem::new("b", HttpMethod::Post, "/pets").with_tags(["pets"]),
            ApiItem::new("c", HttpMethod::Get, "/users").with_tags(["users"]),
        ]
    }

    #[tokio::test]
    async fn test_put_items_and_query() {
        let state = state();

        let response = put_items_handler(State(state.clone()), Json(ItemsRequest { items: items() }))
            .await
            .unwrap();
        assert_eq!(response.count, 3);
        assert_eq!(response.generation, 1);

        let mut spec = QuerySpec {
            filter: FilterSpec::default().with_methods([HttpMethod::Get]),
            ..QuerySpec::default()
        };
        spec.group.by = GroupBy::Tag;
        let response = query_handler(State(state), Json(QueryRequest { spec }))
            .await
            .unwrap();

        assert_eq!(response.result.total_filtered, 2);
        assert_eq!(response.result.grouped_items["pets"].len(), 1);
        assert_eq!(response.result.grouped_items["users"].len(), 1);
    }

    #[tokio::test]
    async fn test_put_items_invalid_request() {
        let state = state();
        let req = ItemsRequest {
            items: vec![ApiItem::new("", HttpMethod::Get, "/a")],
        };

        let result = put_items_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_invalidate_unknown_tag() {
        let result = invalidate_handler(State(state()), Path("colors".to_string())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalidate_known_tag() {
        let state = state();
        state.pipeline.set_items(items());
        state.pipeline.run(&QuerySpec::default());

        let response = invalidate_handler(State(state), Path("sorting".to_string()))
            .await
            .unwrap();
        assert_eq!(response.removed, 1);
    }

    #[tokio::test]
    async fn test_stats_and_report_handlers() {
        let state = state();
        state.pipeline.set_items(items());
        state.pipeline.run(&QuerySpec::default());

        let stats = stats_handler(State(state.clone())).await;
        assert_eq!(stats.items, 3);
        assert_eq!(stats.pools.len(), 3);
        assert_eq!(stats.pools["results"].total_entries, 1);

        let report = report_handler(State(state)).await;
        assert!(report.detailed_stats.contains_key("query"));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[test]
    fn test_live_keys_are_unique() {
        let state = state();
        assert_ne!(state.next_live_key(), state.next_live_key());
    }
}

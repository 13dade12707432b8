//! Query Pipeline
//!
//! Runs search → filter → sort → group over the current item set and caches
//! stage results in three pools, each owned by this pipeline:
//!
//! | Pool      | Holds                        | Dependencies                               |
//! |-----------|------------------------------|--------------------------------------------|
//! | `search`  | ranked indices per query     | `items`                                    |
//! | `filter`  | filtered indices per filter  | `items`, `filters`                         |
//! | `results` | sorted + grouped composite   | `items`, `filters`, `sorting`, `grouping`  |
//!
//! Readers hold the item-set read lock for a whole run; replacing items or
//! invalidating a tag takes the write lock, so a run never observes a
//! partially invalidated state.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{CachePool, CacheStats, CacheStore, PoolMaintenance, SetOptions};
use crate::config::Config;
use crate::error::ComputeError;
use crate::perf::PerformanceSampler;
use crate::query::compute::ComputeBackend;
use crate::query::filter::filter;
use crate::query::group::group;
use crate::query::item::ApiItem;
use crate::query::search::{search, SearchRequest};
use crate::query::sort::sort;
use crate::query::spec::QuerySpec;

pub const SEARCH_POOL: &str = "search";
pub const FILTER_POOL: &str = "filter";
pub const RESULT_POOL: &str = "results";

pub const DEP_ITEMS: &str = "items";
pub const DEP_FILTERS: &str = "filters";
pub const DEP_SORTING: &str = "sorting";
pub const DEP_GROUPING: &str = "grouping";

/// Item sets larger than this are searched through the compute backend.
pub const DEFAULT_OFFLOAD_THRESHOLD: usize = 5_000;

// == Results ==
/// Cached composite: indices into the item set the run observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedResult {
    pub filtered: Vec<usize>,
    pub groups: BTreeMap<String, Vec<usize>>,
}

impl IndexedResult {
    fn materialize(&self, items: &[ApiItem], generation: u64) -> QueryResult {
        let pick = |indices: &[usize]| -> Vec<ApiItem> {
            indices.iter().filter_map(|&i| items.get(i).cloned()).collect()
        };

        QueryResult {
            filtered_items: pick(&self.filtered),
            grouped_items: self
                .groups
                .iter()
                .map(|(name, indices)| (name.clone(), pick(indices)))
                .collect(),
            total_filtered: self.filtered.len(),
            generation,
        }
    }
}

/// What the rendering side receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub filtered_items: Vec<ApiItem>,
    pub grouped_items: BTreeMap<String, Vec<ApiItem>>,
    pub total_filtered: usize,
    /// Item-set generation the result was computed from
    pub generation: u64,
}

#[derive(Debug)]
struct ItemSet {
    items: Arc<Vec<ApiItem>>,
    generation: u64,
}

// == Query Pipeline ==
pub struct QueryPipeline {
    state: RwLock<ItemSet>,
    search_pool: Arc<CachePool<Vec<usize>>>,
    filter_pool: Arc<CachePool<Vec<usize>>>,
    result_pool: Arc<CachePool<IndexedResult>>,
    sampler: Arc<PerformanceSampler>,
    offload_threshold: usize,
}

impl QueryPipeline {
    /// Builds the pipeline with pools sized from `config`.
    pub fn new(config: &Config, sampler: Arc<PerformanceSampler>) -> Self {
        Self::with_stores(
            CacheStore::new(config.search_pool.clone()),
            CacheStore::new(config.filter_pool.clone()),
            CacheStore::new(config.result_pool.clone()),
            sampler,
        )
        .with_offload_threshold(config.offload_threshold)
    }

    /// Builds the pipeline around caller-constructed stores.
    pub fn with_stores(
        search_store: CacheStore<Vec<usize>>,
        filter_store: CacheStore<Vec<usize>>,
        result_store: CacheStore<IndexedResult>,
        sampler: Arc<PerformanceSampler>,
    ) -> Self {
        Self {
            state: RwLock::new(ItemSet {
                items: Arc::new(Vec::new()),
                generation: 0,
            }),
            search_pool: Arc::new(CachePool::new(SEARCH_POOL, search_store)),
            filter_pool: Arc::new(CachePool::new(FILTER_POOL, filter_store)),
            result_pool: Arc::new(CachePool::new(RESULT_POOL, result_store)),
            sampler,
            offload_threshold: DEFAULT_OFFLOAD_THRESHOLD,
        }
    }

    pub fn with_offload_threshold(mut self, threshold: usize) -> Self {
        self.offload_threshold = threshold;
        self
    }

    // == Item Set ==
    /// Replaces the item set and drops everything derived from the old one.
    /// Returns the new generation.
    pub fn set_items(&self, items: Vec<ApiItem>) -> u64 {
        let mut state = self.state.write();
        state.items = Arc::new(items);
        state.generation += 1;
        let removed = self.invalidate_locked(DEP_ITEMS);
        info!(
            "Item set replaced: {} items, generation {}, {} cached results dropped",
            state.items.len(),
            state.generation,
            removed
        );
        state.generation
    }

    pub fn items(&self) -> Arc<Vec<ApiItem>> {
        Arc::clone(&self.state.read().items)
    }

    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn item_count(&self) -> usize {
        self.state.read().items.len()
    }

    // == Run ==
    /// Runs the full pipeline, consulting the caches stage by stage.
    pub fn run(&self, spec: &QuerySpec) -> QueryResult {
        let started = Instant::now();
        let state = self.state.read();
        let key = spec.cache_key();

        let indexed = match self.result_pool.get(&key) {
            Some(hit) => {
                debug!("Composite cache hit");
                hit
            }
            None => {
                let searched = self.search_stage(&state.items, spec);
                let indexed = self.complete(&state.items, spec, searched, true);
                self.result_pool
                    .set(key, indexed.clone(), composite_options());
                indexed
            }
        };

        let result = indexed.materialize(&state.items, state.generation);
        drop(state);
        self.sampler.record("query", started.elapsed());
        result
    }

    /// Runs the pipeline, delegating the search stage to `backend` when the
    /// query is non-empty and the item set exceeds the offload threshold.
    ///
    /// Backend failure or timeout is returned as an error. If the item set
    /// changes while the backend runs, the result is still returned for the
    /// snapshot it was computed from, but nothing is cached.
    pub async fn run_offloaded(
        &self,
        spec: &QuerySpec,
        backend: &dyn ComputeBackend,
        timeout: Duration,
    ) -> Result<QueryResult, ComputeError> {
        let canonical = spec.filter.canonical();
        let (items, generation) = {
            let state = self.state.read();
            (Arc::clone(&state.items), state.generation)
        };

        if canonical.query.is_empty() || items.len() <= self.offload_threshold {
            return Ok(self.run(spec));
        }
        if let Some(result) = self.cached_for(spec, generation) {
            return Ok(result);
        }

        let started = Instant::now();
        let request = SearchRequest::new(canonical.query, canonical.search_fields);
        let searched =
            match tokio::time::timeout(timeout, backend.search(Arc::clone(&items), request)).await {
                Ok(Ok(indices)) => indices,
                Ok(Err(e)) => {
                    warn!("Backend '{}' search failed: {}", backend.name(), e);
                    return Err(e);
                }
                Err(_) => {
                    warn!("Backend '{}' search timed out after {:?}", backend.name(), timeout);
                    return Err(ComputeError::TimedOut(timeout));
                }
            };
        self.sampler.record("search", started.elapsed());

        if let Some(bad) = searched.iter().find(|&&index| index >= items.len()) {
            return Err(ComputeError::Failed(format!(
                "backend '{}' returned index {} for {} items",
                backend.name(),
                bad,
                items.len()
            )));
        }

        let state = self.state.read();
        if state.generation != generation {
            debug!("Item set changed during offloaded search; result not cached");
            let indexed = self.complete(&items, spec, searched, false);
            return Ok(indexed.materialize(&items, generation));
        }

        self.search_pool
            .set(spec.search_key(), searched.clone(), search_options());
        let indexed = self.complete(&state.items, spec, searched, true);
        self.result_pool
            .set(spec.cache_key(), indexed.clone(), composite_options());
        let result = indexed.materialize(&state.items, state.generation);
        drop(state);
        self.sampler.record("query", started.elapsed());
        Ok(result)
    }

    fn cached_for(&self, spec: &QuerySpec, generation: u64) -> Option<QueryResult> {
        let state = self.state.read();
        if state.generation != generation {
            return None;
        }
        self.result_pool
            .get(&spec.cache_key())
            .map(|hit| hit.materialize(&state.items, state.generation))
    }

    // == Stages ==
    fn search_stage(&self, items: &[ApiItem], spec: &QuerySpec) -> Vec<usize> {
        let canonical = spec.filter.canonical();
        if canonical.query.is_empty() {
            return (0..items.len()).collect();
        }

        let key = spec.search_key();
        if let Some(hit) = self.search_pool.get(&key) {
            return hit;
        }
        let request = SearchRequest::new(canonical.query, canonical.search_fields);
        let searched = self.sampler.time("search", || search(items, &request));
        self.search_pool.set(key, searched.clone(), search_options());
        searched
    }

    /// Filter, sort and group an already searched index list.
    fn complete(
        &self,
        items: &[ApiItem],
        spec: &QuerySpec,
        searched: Vec<usize>,
        use_cache: bool,
    ) -> IndexedResult {
        let mut filtered = if use_cache {
            self.filter_stage(items, spec, &searched)
        } else {
            self.sampler
                .time("filter", || filter(items, &searched, &spec.filter))
        };

        self.sampler
            .time("sort", || sort(items, &mut filtered, &spec.sort));
        let groups = self
            .sampler
            .time("group", || group(items, &filtered, spec.group.by));

        IndexedResult { filtered, groups }
    }

    fn filter_stage(&self, items: &[ApiItem], spec: &QuerySpec, searched: &[usize]) -> Vec<usize> {
        if !spec.filter.has_predicates() {
            return searched.to_vec();
        }

        let key = spec.filter_key();
        if let Some(hit) = self.filter_pool.get(&key) {
            return hit;
        }
        let filtered = self
            .sampler
            .time("filter", || filter(items, searched, &spec.filter));
        self.filter_pool
            .set(key, filtered.clone(), filter_options());
        filtered
    }

    // == Invalidation ==
    /// Drops every cached entry tagged with `tag` across all pools.
    pub fn invalidate(&self, tag: &str) -> usize {
        let _guard = self.state.write();
        let removed = self.invalidate_locked(tag);
        debug!("Invalidated {} entries tagged '{}'", removed, tag);
        removed
    }

    fn invalidate_locked(&self, tag: &str) -> usize {
        self.search_pool.invalidate_by_dependency(tag)
            + self.filter_pool.invalidate_by_dependency(tag)
            + self.result_pool.invalidate_by_dependency(tag)
    }

    // == Diagnostics ==
    pub fn pools(&self) -> Vec<Arc<dyn PoolMaintenance>> {
        vec![
            Arc::clone(&self.search_pool) as Arc<dyn PoolMaintenance>,
            Arc::clone(&self.filter_pool) as Arc<dyn PoolMaintenance>,
            Arc::clone(&self.result_pool) as Arc<dyn PoolMaintenance>,
        ]
    }

    pub fn cache_stats(&self) -> BTreeMap<String, CacheStats> {
        self.pools()
            .iter()
            .map(|pool| (pool.name().to_string(), pool.stats()))
            .collect()
    }

    pub fn sampler(&self) -> &Arc<PerformanceSampler> {
        &self.sampler
    }
}

fn search_options() -> SetOptions {
    SetOptions::new().depends_on(DEP_ITEMS)
}

fn filter_options() -> SetOptions {
    SetOptions::new()
        .depends_on(DEP_ITEMS)
        .depends_on(DEP_FILTERS)
}

fn composite_options() -> SetOptions {
    SetOptions::new()
        .depends_on(DEP_ITEMS)
        .depends_on(DEP_FILTERS)
        .depends_on(DEP_SORTING)
        .depends_on(DEP_GROUPING)
}

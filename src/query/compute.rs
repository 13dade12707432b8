//! Offloaded Compute
//!
//! Asynchronous boundary for running the search stage outside the request
//! path. Calls may complete out of order and may be cancelled; failures are
//! reported as [`ComputeError`] and never as empty results.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::ComputeError;
use crate::query::item::ApiItem;
use crate::query::search::{search, SearchRequest};

// == Compute Backend ==
#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Runs the search stage over `items`. Returned values index into
    /// `items`.
    async fn search(
        &self,
        items: Arc<Vec<ApiItem>>,
        request: SearchRequest,
    ) -> Result<Vec<usize>, ComputeError>;
}

// == Blocking Backend ==
/// Runs the in-process search on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingBackend;

#[async_trait]
impl ComputeBackend for BlockingBackend {
    fn name(&self) -> &str {
        "blocking"
    }

    async fn search(
        &self,
        items: Arc<Vec<ApiItem>>,
        request: SearchRequest,
    ) -> Result<Vec<usize>, ComputeError> {
        tokio::task::spawn_blocking(move || search(&items, &request))
            .await
            .map_err(|e| {
                if e.is_cancelled() {
                    ComputeError::Cancelled
                } else {
                    warn!("Blocking search task panicked: {}", e);
                    ComputeError::Failed(e.to_string())
                }
            })
    }
}

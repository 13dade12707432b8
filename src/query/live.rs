//! Live Queries
//!
//! Debounced recomputation for interactive clients. Each submitted spec
//! re-arms one timer; when the client goes quiet the pipeline runs once
//! with the last spec, through the same offload boundary as a one-shot
//! query, and the outcome is broadcast to subscribers.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::Config;
use crate::error::ComputeError;
use crate::query::compute::{BlockingBackend, ComputeBackend};
use crate::query::pipeline::{QueryPipeline, QueryResult};
use crate::query::spec::QuerySpec;
use crate::scheduler::DebounceScheduler;

const CHANNEL_CAPACITY: usize = 16;

/// Outcome of one debounced run. Compute failures reach subscribers as-is.
pub type LiveUpdate = Result<Arc<QueryResult>, ComputeError>;

// == Live Query ==
pub struct LiveQuery {
    key: String,
    pipeline: Arc<QueryPipeline>,
    backend: Arc<dyn ComputeBackend>,
    compute_timeout: Duration,
    scheduler: DebounceScheduler,
    delay: Duration,
    sender: broadcast::Sender<LiveUpdate>,
    /// Run started by the last fired timer, if still computing
    in_flight: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl LiveQuery {
    /// Creates a live query timed under `key` on a shared scheduler.
    ///
    /// Large searches go to the in-process blocking backend until
    /// [`LiveQuery::with_backend`] says otherwise.
    pub fn new(
        key: impl Into<String>,
        pipeline: Arc<QueryPipeline>,
        scheduler: DebounceScheduler,
        delay: Duration,
    ) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            key: key.into(),
            pipeline,
            backend: Arc::new(BlockingBackend),
            compute_timeout: Config::default().compute_timeout(),
            scheduler,
            delay,
            sender,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Offloads large searches to `backend`, giving up after `timeout`.
    pub fn with_backend(mut self, backend: Arc<dyn ComputeBackend>, timeout: Duration) -> Self {
        self.backend = backend;
        self.compute_timeout = timeout;
        self
    }

    /// Replaces the pending spec and restarts the quiet period.
    ///
    /// A run still computing for an earlier spec is aborted when the new
    /// timer fires, so subscribers never see results out of order.
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, spec: QuerySpec) {
        let pipeline = Arc::clone(&self.pipeline);
        let backend = Arc::clone(&self.backend);
        let timeout = self.compute_timeout;
        let sender = self.sender.clone();
        let in_flight = Arc::clone(&self.in_flight);

        self.scheduler.schedule(self.key.clone(), self.delay, move || {
            let run = tokio::spawn(async move {
                let update = pipeline
                    .run_offloaded(&spec, backend.as_ref(), timeout)
                    .await
                    .map(Arc::new);
                // Nobody listening is not an error
                let _ = sender.send(update);
            });
            if let Some(previous) = in_flight.lock().replace(run) {
                previous.abort();
            }
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveUpdate> {
        self.sender.subscribe()
    }

    /// Drops the pending recomputation and any run still computing.
    /// Returns true if a timer was pending.
    pub fn cancel(&self) -> bool {
        self.abort_in_flight();
        self.scheduler.cancel(&self.key)
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending(&self.key)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn abort_in_flight(&self) {
        if let Some(run) = self.in_flight.lock().take() {
            if !run.is_finished() {
                debug!("Aborting in-flight live run '{}'", self.key);
            }
            run.abort();
        }
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        self.scheduler.cancel(&self.key);
        self.abort_in_flight();
    }
}

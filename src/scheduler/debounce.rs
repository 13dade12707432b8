//! Debounce Scheduler
//!
//! Keeps at most one armed timer per key. Scheduling under a key that is
//! already armed cancels the pending timer and starts a new one, so a burst
//! of calls fires a single trailing callback carrying the last call's work.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// One armed timer. `generation` identifies which scheduling call armed it.
#[derive(Debug)]
struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

// == Debounce Scheduler ==
/// Per-key debounced invocation on the Tokio runtime.
///
/// Clones share the same timer table.
#[derive(Debug, Clone, Default)]
pub struct DebounceScheduler {
    timers: Arc<Mutex<HashMap<String, PendingTimer>>>,
    generation: Arc<AtomicU64>,
}

impl DebounceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    // == Schedule ==
    /// Arms `callback` to run once `delay` passes without another call for
    /// `key`. Any timer already pending under `key` is cancelled.
    ///
    /// Returns immediately. Must be called from within a Tokio runtime.
    /// The callback may itself schedule or cancel keys.
    pub fn schedule<F>(&self, key: impl Into<String>, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let key = key.into();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let timers = Arc::clone(&self.timers);
        let task_key = key.clone();

        // The table lock is held until the new timer is registered, so the
        // task cannot look itself up before it exists.
        let mut table = self.timers.lock();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let still_armed = {
                let mut timers = timers.lock();
                match timers.get(&task_key) {
                    Some(timer) if timer.generation == generation => {
                        timers.remove(&task_key);
                        true
                    }
                    _ => false,
                }
            };

            // Runs outside the lock.
            if still_armed {
                debug!("Debounce timer '{}' fired", task_key);
                callback();
            }
        });

        if let Some(previous) = table.insert(key, PendingTimer { generation, handle }) {
            previous.handle.abort();
        }
    }

    // == Cancel ==
    /// Disarms the timer under `key` without firing it. Returns true if one
    /// was pending.
    pub fn cancel(&self, key: &str) -> bool {
        match self.timers.lock().remove(key) {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Disarms every pending timer. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<PendingTimer> = self.timers.lock().drain().map(|(_, t)| t).collect();
        for timer in &drained {
            timer.handle.abort();
        }
        drained.len()
    }

    /// Number of armed timers.
    pub fn pending_count(&self) -> usize {
        self.timers.lock().len()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.timers.lock().contains_key(key)
    }
}

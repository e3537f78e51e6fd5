//! Deduplicating work queue of bird keys.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use brood_api::ObjectKey;
use brood_reconcile::BackoffPolicy;
use tokio::sync::Notify;
use tracing::trace;

/// Keyed work queue.
///
/// - A key waits in the queue at most once, however often it is added.
/// - A key handed to a worker is not handed to another until [`done`] is
///   called for it.
/// - A key added while being processed is queued again on [`done`].
///
/// [`done`]: WorkQueue::done
pub struct WorkQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    backoff: BackoffPolicy,
}

#[derive(Default)]
struct QueueState {
    queue: VecDeque<ObjectKey>,
    /// Keys waiting to be processed, whether in `queue` or parked behind a
    /// run in progress.
    dirty: HashSet<ObjectKey>,
    processing: HashSet<ObjectKey>,
    failures: HashMap<ObjectKey, u32>,
    shutting_down: bool,
}

impl WorkQueue {
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            backoff,
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add(&self, key: ObjectKey) {
        let mut state = self.state();
        if state.shutting_down || !state.dirty.insert(key.clone()) {
            return;
        }
        if state.processing.contains(&key) {
            trace!(key = %key, "Key in progress, parked");
            return;
        }
        state.queue.push_back(key);
        drop(state);
        self.notify.notify_one();
    }

    /// Re-adds `key` after its backoff delay and returns that delay.
    ///
    /// Consecutive failures grow the delay until [`forget`](Self::forget)
    /// is called.
    pub fn add_rate_limited(self: &Arc<Self>, key: ObjectKey) -> Duration {
        let attempt = {
            let mut state = self.state();
            let failures = state.failures.entry(key.clone()).or_insert(0);
            *failures += 1;
            *failures - 1
        };
        let delay = self.backoff.delay(attempt);

        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(key);
        });
        delay
    }

    /// Clears the failure count for `key`.
    pub fn forget(&self, key: &ObjectKey) {
        self.state().failures.remove(key);
    }

    /// Consecutive failures recorded for `key`.
    pub fn num_requeues(&self, key: &ObjectKey) -> u32 {
        self.state().failures.get(key).copied().unwrap_or(0)
    }

    /// Waits for the next key. Returns `None` once the queue is shut down.
    pub async fn get(&self) -> Option<ObjectKey> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state();
                if state.shutting_down {
                    return None;
                }
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    return Some(key);
                }
            }
            notified.await;
        }
    }

    /// Marks `key` as no longer being processed.
    pub fn done(&self, key: &ObjectKey) {
        let mut state = self.state();
        state.processing.remove(key);
        if state.dirty.contains(key) && !state.shutting_down {
            state.queue.push_back(key.clone());
            drop(state);
            self.notify.notify_one();
        }
    }

    /// Keys waiting to be handed out.
    pub fn len(&self) -> usize {
        self.state().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops handing out keys and wakes every waiting worker.
    pub fn shutdown(&self) {
        self.state().shutting_down = true;
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state().shutting_down
    }
}

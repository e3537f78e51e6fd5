//! Controller loop: turns store events into reconciliation runs.

use std::sync::Arc;
use std::time::Duration;

use brood_api::{Bird, Egg, Resource};
use brood_reconcile::BackoffPolicy;
use brood_store::{Context, ListParams, ResourceStore, StoreError, WatchEvent};
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::owner_index::OwnerIndexConfig;
use crate::queue::WorkQueue;
use crate::reconciler::{BirdReconciler, ReconcileOutcome};

/// Shortest accepted resync interval.
const MIN_RESYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Concurrent reconciliation workers.
    pub workers: usize,

    /// Upper bound on a single run.
    pub reconcile_timeout: Duration,

    /// Interval at which every bird is re-queued.
    pub resync_interval: Duration,

    /// Retry delays for failed runs.
    pub backoff: BackoffPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            reconcile_timeout: Duration::from_secs(30),
            resync_interval: Duration::from_secs(300),
            backoff: BackoffPolicy::default(),
        }
    }
}

impl From<&Config> for ControllerConfig {
    fn from(config: &Config) -> Self {
        Self {
            workers: config.workers,
            reconcile_timeout: config.reconcile_timeout,
            resync_interval: config.resync_interval,
            backoff: config.backoff.clone(),
        }
    }
}

/// Watches birds and eggs and keeps every bird reconciled.
///
/// Bird events queue the bird itself; egg events queue the bird that
/// controls the egg. A given bird is reconciled by at most one worker at a
/// time.
pub struct Controller {
    birds: Arc<dyn ResourceStore<Bird>>,
    eggs: Arc<dyn ResourceStore<Egg>>,
    reconciler: Arc<BirdReconciler>,
    queue: Arc<WorkQueue>,
    config: ControllerConfig,
}

impl Controller {
    pub fn new(
        birds: Arc<dyn ResourceStore<Bird>>,
        eggs: Arc<dyn ResourceStore<Egg>>,
        owner_index: OwnerIndexConfig,
        config: ControllerConfig,
    ) -> Self {
        let reconciler = Arc::new(BirdReconciler::new(birds.clone(), eggs.clone(), owner_index));
        let queue = Arc::new(WorkQueue::new(config.backoff.clone()));
        Self {
            birds,
            eggs,
            reconciler,
            queue,
            config,
        }
    }

    pub fn queue(&self) -> &Arc<WorkQueue> {
        &self.queue
    }

    /// Runs until `shutdown` flips to `true`.
    ///
    /// Registers the owner index first; failing to do so is fatal.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), StoreError> {
        let owner_index = self.reconciler.owner_index();
        owner_index.register(self.eggs.as_ref()).await?;

        info!(
            workers = self.config.workers,
            reconcile_timeout_secs = self.config.reconcile_timeout.as_secs(),
            resync_interval_secs = self.config.resync_interval.as_secs(),
            index = %owner_index.index_name,
            "Starting controller"
        );

        // Subscribe before the first full enqueue so nothing falls between.
        let mut bird_events = self.birds.watch();
        let mut egg_events = self.eggs.watch();

        let mut workers = JoinSet::new();
        for worker in 0..self.config.workers.max(1) {
            workers.spawn(run_worker(
                worker,
                self.queue.clone(),
                self.reconciler.clone(),
                self.config.reconcile_timeout,
                shutdown.clone(),
            ));
        }

        // The first tick fires immediately and queues every bird.
        let mut resync = tokio::time::interval(self.config.resync_interval.max(MIN_RESYNC_INTERVAL));

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Controller shutting down");
                        break;
                    }
                }
                _ = resync.tick() => {
                    self.enqueue_all(&shutdown).await;
                }
                event = bird_events.recv() => match event {
                    Ok(event) => self.queue.add(event.object().key()),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, kind = Bird::KIND, "Watch lagged, requeueing all birds");
                        self.enqueue_all(&shutdown).await;
                    }
                    Err(RecvError::Closed) => {
                        error!(kind = Bird::KIND, "Watch closed");
                        break;
                    }
                },
                event = egg_events.recv() => match event {
                    Ok(WatchEvent::Applied(egg) | WatchEvent::Deleted(egg)) => {
                        if let Some(owner) = owner_index.owner_key(&egg) {
                            self.queue.add(owner);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, kind = Egg::KIND, "Watch lagged, requeueing all birds");
                        self.enqueue_all(&shutdown).await;
                    }
                    Err(RecvError::Closed) => {
                        error!(kind = Egg::KIND, "Watch closed");
                        break;
                    }
                },
            }
        }

        self.queue.shutdown();
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Worker task panicked");
            }
        }

        info!("Controller stopped");
        Ok(())
    }

    async fn enqueue_all(&self, shutdown: &watch::Receiver<bool>) {
        let ctx = Context::background().with_cancel(shutdown.clone());
        match self.birds.list(&ctx, &ListParams::all()).await {
            Ok(birds) => {
                debug!(count = birds.len(), "Queueing all birds");
                for bird in birds {
                    self.queue.add(bird.key());
                }
            }
            Err(e) => warn!(error = %e, "Failed to list birds for resync"),
        }
    }
}

async fn run_worker(
    worker: usize,
    queue: Arc<WorkQueue>,
    reconciler: Arc<BirdReconciler>,
    timeout: Duration,
    shutdown: watch::Receiver<bool>,
) {
    debug!(worker, "Worker started");

    while let Some(key) = queue.get().await {
        let ctx = Context::background()
            .with_cancel(shutdown.clone())
            .with_timeout(timeout);

        match reconciler.reconcile(&ctx, &key).await {
            Ok(outcome) => {
                queue.forget(&key);
                if let ReconcileOutcome::Reconciled { created, deleted, observed, .. } = outcome {
                    if created > 0 || deleted > 0 {
                        info!(key = %key, created, deleted, observed, "Reconciled bird");
                    }
                }
            }
            Err(e) if queue.is_shutting_down() => {
                debug!(key = %key, error = %e, "Reconciliation interrupted by shutdown");
            }
            Err(e) if e.is_transient() => {
                let delay = queue.add_rate_limited(key.clone());
                warn!(
                    key = %key,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Reconciliation failed, requeueing"
                );
            }
            Err(e) => {
                // Retried only by the next watch event or resync for this key.
                queue.forget(&key);
                warn!(key = %key, error = %e, "Reconciliation failed permanently, dropping");
            }
        }

        queue.done(&key);
    }

    debug!(worker, "Worker stopped");
}

//! Bird reconciliation.
//!
//! A run reads the bird and its eggs fresh, converges the egg count on the
//! desired count and publishes the observed count. Runs hold no state
//! between invocations; everything is derived from the store.

use std::sync::Arc;

use brood_api::{Bird, Egg, ObjectKey};
use brood_id::RunId;
use brood_reconcile::{
    desired_count, is_clamped, select_excess, status_needs_update, CardinalityPlan,
};
use brood_store::{Context, ResourceStore, StoreResultExt};
use tracing::{debug, info, instrument, warn};

use crate::error::ReconcileError;
use crate::factory::EggFactory;
use crate::owner_index::OwnerIndexConfig;

/// What a successful run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The bird no longer exists; nothing to do.
    ParentGone,

    Reconciled {
        created: usize,
        deleted: usize,
        /// Eggs owned after the run.
        observed: usize,
        status_updated: bool,
    },
}

/// Converges one bird's eggs on its desired count.
pub struct BirdReconciler {
    birds: Arc<dyn ResourceStore<Bird>>,
    eggs: Arc<dyn ResourceStore<Egg>>,
    owner_index: OwnerIndexConfig,
    factory: EggFactory,
}

impl BirdReconciler {
    pub fn new(
        birds: Arc<dyn ResourceStore<Bird>>,
        eggs: Arc<dyn ResourceStore<Egg>>,
        owner_index: OwnerIndexConfig,
    ) -> Self {
        let factory = EggFactory::new(eggs.clone());
        Self {
            birds,
            eggs,
            owner_index,
            factory,
        }
    }

    pub fn owner_index(&self) -> &OwnerIndexConfig {
        &self.owner_index
    }

    /// Runs one reconciliation pass for the bird at `key`.
    ///
    /// Returns the first failure; retrying is up to the caller.
    #[instrument(
        skip(self, ctx),
        fields(namespace = %key.namespace, name = %key.name, run_id = %RunId::new())
    )]
    pub async fn reconcile(
        &self,
        ctx: &Context,
        key: &ObjectKey,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let Some(bird) = self.birds.get(ctx, key).await.ignore_not_found()? else {
            debug!("Bird not found, nothing to reconcile");
            return Ok(ReconcileOutcome::ParentGone);
        };

        let eggs = self.list_eggs(ctx, key).await?;

        let desired = bird.spec.egg_numbers;
        if is_clamped(desired) {
            warn!(egg_numbers = ?desired, "Negative desired egg count treated as zero");
        }
        let target = desired_count(desired);
        let plan = CardinalityPlan::compute(desired, eggs.len());
        debug!(
            observed = eggs.len(),
            desired = target,
            converged = plan.status().is_converged(),
            ?plan,
            "Planned reconciliation"
        );

        let mut created = 0;
        let mut deleted = 0;
        match plan {
            CardinalityPlan::Converged => {}
            CardinalityPlan::Delete(_) => {
                // Keep the oldest eggs; name breaks timestamp ties.
                let (_, excess) = select_excess(eggs, target, |egg| {
                    (egg.metadata.creation_timestamp, egg.metadata.name.clone())
                });
                for egg in &excess {
                    if self.delete_egg(ctx, egg).await? {
                        deleted += 1;
                    }
                }
            }
            CardinalityPlan::Create(count) => {
                for _ in 0..count {
                    let egg = self.factory.create_egg(ctx, &bird).await?;
                    info!(egg = %egg.metadata.name, "Created egg");
                    created += 1;
                }
            }
        }

        let observed = self.list_eggs(ctx, key).await?.len();

        let status_updated = status_needs_update(bird.status.egg_numbers, observed);
        if status_updated {
            let recorded = bird.status.egg_numbers;
            let mut next = bird;
            next.status.egg_numbers = Some(i32::try_from(observed).unwrap_or(i32::MAX));
            self.birds.update_status(ctx, next).await?;
            info!(observed, recorded = ?recorded, "Updated bird status");
        }

        Ok(ReconcileOutcome::Reconciled {
            created,
            deleted,
            observed,
            status_updated,
        })
    }

    async fn list_eggs(&self, ctx: &Context, key: &ObjectKey) -> Result<Vec<Egg>, ReconcileError> {
        let params = self.owner_index.list_params(key);
        Ok(self.eggs.list(ctx, &params).await?)
    }

    /// Returns false if the egg was already gone.
    async fn delete_egg(&self, ctx: &Context, egg: &Egg) -> Result<bool, ReconcileError> {
        let key = egg.metadata.key();
        match self.eggs.delete(ctx, &key).await.ignore_not_found()? {
            Some(()) => {
                info!(egg = %key.name, "Deleted egg");
                Ok(true)
            }
            None => {
                debug!(egg = %key.name, "Egg already gone");
                Ok(false)
            }
        }
    }
}

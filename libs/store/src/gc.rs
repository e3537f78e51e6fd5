//! Cascading deletion of owned objects.

use std::sync::Arc;

use brood_api::{OwnerReference, Resource};
use tokio::sync::{broadcast::error::RecvError, watch};
use tracing::{debug, info, instrument, warn};

use crate::context::Context;
use crate::error::StoreResult;
use crate::ops::StoreResultExt;
use crate::store::{ListParams, ResourceStore, WatchEvent};

/// Deletes `D` objects whose `O` owner has been deleted.
///
/// Ownership is established by owner references to `O::API_VERSION` and
/// `O::KIND` and is matched on uid, so a recreated owner with the same name does not adopt
/// the dependents of its predecessor.
pub struct GarbageCollector<O: Resource, D: Resource> {
    owners: Arc<dyn ResourceStore<O>>,
    dependents: Arc<dyn ResourceStore<D>>,
}

impl<O: Resource, D: Resource> GarbageCollector<O, D> {
    pub fn new(owners: Arc<dyn ResourceStore<O>>, dependents: Arc<dyn ResourceStore<D>>) -> Self {
        Self { owners, dependents }
    }

    /// Runs until `shutdown` flips to `true`.
    ///
    /// Sweeps once on start and again whenever the owner watch lags, since
    /// deletions may have been missed in either case.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(owner = O::KIND, dependent = D::KIND, "Starting garbage collector");

        let mut events = self.owners.watch();
        let ctx = Context::background().with_cancel(shutdown.clone());
        self.sweep_logged(&ctx).await;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Garbage collector shutting down");
                        break;
                    }
                }
                event = events.recv() => match event {
                    Ok(WatchEvent::Deleted(owner)) => {
                        if let Err(e) = self.collect(&ctx, &owner).await {
                            warn!(error = %e, owner = %owner.key(), "Failed to collect dependents");
                        }
                    }
                    Ok(WatchEvent::Applied(_)) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Owner watch lagged, sweeping for orphans");
                        self.sweep_logged(&ctx).await;
                    }
                    Err(RecvError::Closed) => {
                        info!("Owner watch closed, garbage collector stopping");
                        break;
                    }
                },
            }
        }
    }

    /// Deletes every dependent referencing `owner`. Returns how many were
    /// deleted.
    #[instrument(skip(self, ctx, owner), fields(owner = %owner.key()))]
    pub async fn collect(&self, ctx: &Context, owner: &O) -> StoreResult<usize> {
        let Some(uid) = owner.meta().uid else {
            return Ok(0);
        };

        let candidates = self
            .dependents
            .list(ctx, &ListParams::in_namespace(&owner.meta().namespace))
            .await?;

        let mut deleted = 0;
        for dependent in candidates {
            let owned = self
                .owner_refs(&dependent)
                .any(|r| r.uid == uid);
            if owned && self.delete(ctx, &dependent).await? {
                deleted += 1;
            }
        }

        if deleted > 0 {
            info!(deleted, "Collected dependents of deleted owner");
        }
        Ok(deleted)
    }

    /// Deletes dependents none of whose `O` owners still exist.
    pub async fn sweep(&self, ctx: &Context) -> StoreResult<usize> {
        let dependents = self.dependents.list(ctx, &ListParams::all()).await?;

        let mut deleted = 0;
        for dependent in dependents {
            let refs: Vec<&OwnerReference> = self.owner_refs(&dependent).collect();
            if refs.is_empty() {
                continue;
            }

            let mut orphaned = true;
            for owner_ref in refs {
                if self.owner_alive(ctx, &dependent, owner_ref).await? {
                    orphaned = false;
                    break;
                }
            }

            if orphaned && self.delete(ctx, &dependent).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn sweep_logged(&self, ctx: &Context) {
        match self.sweep(ctx).await {
            Ok(0) => {}
            Ok(deleted) => info!(deleted, "Swept orphaned dependents"),
            Err(e) => warn!(error = %e, "Orphan sweep failed"),
        }
    }

    fn owner_refs<'a>(&self, dependent: &'a D) -> impl Iterator<Item = &'a OwnerReference> {
        dependent
            .meta()
            .owner_references
            .iter()
            .filter(|r| r.refers_to(O::API_VERSION, O::KIND))
    }

    async fn owner_alive(&self, ctx: &Context, dependent: &D, owner_ref: &OwnerReference) -> StoreResult<bool> {
        let key = brood_api::ObjectKey::new(&dependent.meta().namespace, &owner_ref.name);
        let owner = self.owners.get(ctx, &key).await.ignore_not_found()?;
        Ok(owner.is_some_and(|o| o.meta().uid == Some(owner_ref.uid)))
    }

    /// Returns false if the dependent was already gone.
    async fn delete(&self, ctx: &Context, dependent: &D) -> StoreResult<bool> {
        let key = dependent.key();
        let deleted = self.dependents.delete(ctx, &key).await.ignore_not_found()?;
        if deleted.is_some() {
            debug!(kind = D::KIND, key = %key, "Garbage collected dependent");
        }
        Ok(deleted.is_some())
    }
}

#[cfg(test)]
mod tests {
    use brood_api::{set_controller_reference, Bird, Egg, ObjectKey};

    use super::*;
    use crate::MemoryStore;

    struct Fixture {
        birds: Arc<MemoryStore<Bird>>,
        eggs: Arc<MemoryStore<Egg>>,
        gc: GarbageCollector<Bird, Egg>,
    }

    fn fixture() -> Fixture {
        let birds = Arc::new(MemoryStore::<Bird>::new());
        let eggs = Arc::new(MemoryStore::<Egg>::new());
        let gc = GarbageCollector::new(
            birds.clone() as Arc<dyn ResourceStore<Bird>>,
            eggs.clone() as Arc<dyn ResourceStore<Egg>>,
        );
        Fixture { birds, eggs, gc }
    }

    async fn lay(eggs: &MemoryStore<Egg>, bird: &Bird, name: &str) {
        let mut egg = Egg::new(&bird.metadata.namespace, name);
        set_controller_reference(bird, &mut egg).unwrap();
        eggs.create(&Context::background(), egg).await.unwrap();
    }

    #[tokio::test]
    async fn test_collect_deletes_only_owned_dependents() {
        let f = fixture();
        let ctx = Context::background();
        let robin = f.birds.create(&ctx, Bird::new("default", "robin", Some(2))).await.unwrap();
        let wren = f.birds.create(&ctx, Bird::new("default", "wren", Some(1))).await.unwrap();
        lay(&f.eggs, &robin, "r1").await;
        lay(&f.eggs, &robin, "r2").await;
        lay(&f.eggs, &wren, "w1").await;
        f.eggs.create(&ctx, Egg::new("default", "stray")).await.unwrap();

        let deleted = f.gc.collect(&ctx, &robin).await.unwrap();

        assert_eq!(deleted, 2);
        let left: Vec<String> = f
            .eggs
            .list(&ctx, &ListParams::all())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.metadata.name)
            .collect();
        assert_eq!(left, vec!["stray", "w1"]);
    }

    #[tokio::test]
    async fn test_sweep_spares_dependents_of_live_owner() {
        let f = fixture();
        let ctx = Context::background();
        let robin = f.birds.create(&ctx, Bird::new("default", "robin", Some(1))).await.unwrap();
        lay(&f.eggs, &robin, "r1").await;

        // Recreate the owner under the same name; the old egg is orphaned.
        f.birds.delete(&ctx, &robin.key()).await.unwrap();
        let reborn = f.birds.create(&ctx, Bird::new("default", "robin", Some(1))).await.unwrap();
        lay(&f.eggs, &reborn, "r2").await;

        let deleted = f.gc.sweep(&ctx).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(f.eggs.get(&ctx, &ObjectKey::new("default", "r1")).await.is_err());
        assert!(f.eggs.get(&ctx, &ObjectKey::new("default", "r2")).await.is_ok());
    }

    #[tokio::test]
    async fn test_ignores_same_kind_from_other_group_version() {
        let f = fixture();
        let ctx = Context::background();
        let robin = f.birds.create(&ctx, Bird::new("default", "robin", Some(1))).await.unwrap();

        let mut foreign = Egg::new("default", "foreign");
        set_controller_reference(&robin, &mut foreign).unwrap();
        foreign.metadata.owner_references[0].api_version = "other.domain/v1".to_string();
        f.eggs.create(&ctx, foreign).await.unwrap();

        // Neither an owner delete nor a sweep treats it as a Bird dependent.
        assert_eq!(f.gc.collect(&ctx, &robin).await.unwrap(), 0);
        f.birds.delete(&ctx, &robin.key()).await.unwrap();
        assert_eq!(f.gc.sweep(&ctx).await.unwrap(), 0);
        assert!(f.eggs.get(&ctx, &ObjectKey::new("default", "foreign")).await.is_ok());
    }

    #[tokio::test]
    async fn test_run_collects_on_owner_delete() {
        let f = fixture();
        let ctx = Context::background();
        let robin = f.birds.create(&ctx, Bird::new("default", "robin", Some(1))).await.unwrap();
        lay(&f.eggs, &robin, "r1").await;

        let (tx, rx) = watch::channel(false);
        let gc = Arc::new(f.gc);
        let task = tokio::spawn({
            let gc = gc.clone();
            async move { gc.run(rx).await }
        });

        let mut egg_events = f.eggs.watch();
        f.birds.delete(&ctx, &robin.key()).await.unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_secs(5), egg_events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, WatchEvent::Deleted(ref e) if e.metadata.name == "r1"));

        tx.send(true).unwrap();
        task.await.unwrap();
    }
}

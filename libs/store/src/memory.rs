//! In-process store implementation.

use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use async_trait::async_trait;
use brood_api::{ObjectKey, Resource};
use brood_id::ObjectUid;
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, trace};

use crate::context::Context;
use crate::error::{StoreError, StoreResult};
use crate::store::{IndexFn, ListParams, ResourceStore, WatchEvent};

/// Buffered watch events per subscriber before it starts lagging.
const WATCH_CAPACITY: usize = 1024;

/// Longest accepted object name.
pub const MAX_NAME_LEN: usize = 253;

/// Store holding objects of one kind in memory.
///
/// Writes are serialized by a single lock and publish their watch event
/// before releasing it, so subscribers observe events in resource version
/// order.
pub struct MemoryStore<R: Resource> {
    state: RwLock<State<R>>,
    events: broadcast::Sender<WatchEvent<R>>,
}

struct State<R> {
    objects: BTreeMap<ObjectKey, R>,
    indexes: BTreeMap<String, Index<R>>,
    last_version: u64,
}

/// A named index: `(namespace, value) -> names`.
struct Index<R> {
    derive: IndexFn<R>,
    postings: BTreeMap<(String, String), BTreeSet<String>>,
}

impl<R: Resource> Index<R> {
    fn insert(&mut self, object: &R) {
        let meta = object.meta();
        for value in (self.derive)(object) {
            self.postings
                .entry((meta.namespace.clone(), value))
                .or_default()
                .insert(meta.name.clone());
        }
    }

    fn remove(&mut self, object: &R) {
        let meta = object.meta();
        for value in (self.derive)(object) {
            if let Entry::Occupied(mut entry) = self.postings.entry((meta.namespace.clone(), value)) {
                entry.get_mut().remove(&meta.name);
                if entry.get().is_empty() {
                    entry.remove();
                }
            }
        }
    }

    fn keys(&self, namespace: Option<&str>, value: &str) -> Vec<ObjectKey> {
        match namespace {
            Some(namespace) => self
                .postings
                .get(&(namespace.to_string(), value.to_string()))
                .map(|names| names.iter().map(|n| ObjectKey::new(namespace, n)).collect())
                .unwrap_or_default(),
            None => self
                .postings
                .iter()
                .filter(|((_, v), _)| v == value)
                .flat_map(|((ns, _), names)| names.iter().map(move |n| ObjectKey::new(ns, n)))
                .collect(),
        }
    }
}

impl<R: Resource> State<R> {
    fn next_version(&mut self) -> u64 {
        self.last_version += 1;
        self.last_version
    }

    fn reindex(&mut self, old: Option<&R>, new: Option<&R>) {
        for index in self.indexes.values_mut() {
            if let Some(old) = old {
                index.remove(old);
            }
            if let Some(new) = new {
                index.insert(new);
            }
        }
    }

    fn current(&self, key: &ObjectKey) -> StoreResult<&R> {
        self.objects.get(key).ok_or_else(|| StoreError::NotFound {
            kind: R::KIND,
            key: key.clone(),
        })
    }
}

impl<R: Resource> MemoryStore<R> {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(WATCH_CAPACITY);
        Self {
            state: RwLock::new(State {
                objects: BTreeMap::new(),
                indexes: BTreeMap::new(),
                last_version: 0,
            }),
            events,
        }
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.state.read().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn publish(&self, event: WatchEvent<R>) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    /// Stores `next` in place of the object at `key`, bumping its version.
    fn commit(&self, state: &mut State<R>, key: ObjectKey, mut next: R) -> R {
        next.meta_mut().resource_version = state.next_version();
        let previous = state.objects.insert(key, next.clone());
        state.reindex(previous.as_ref(), Some(&next));
        self.publish(WatchEvent::Applied(next.clone()));
        next
    }
}

impl<R: Resource> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn validate<R: Resource>(object: &R) -> StoreResult<()> {
    let meta = object.meta();
    if meta.namespace.is_empty() {
        return Err(invalid::<R>("namespace is required"));
    }
    if !is_valid_name(&meta.name) {
        return Err(invalid::<R>(format!(
            "name '{}' must be 1-{MAX_NAME_LEN} lowercase alphanumerics, '-' or '.', starting and ending alphanumeric",
            meta.name
        )));
    }
    Ok(())
}

fn invalid<R: Resource>(message: impl Into<String>) -> StoreError {
    StoreError::Invalid {
        kind: R::KIND,
        message: message.into(),
    }
}

fn is_valid_name(name: &str) -> bool {
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    name.len() <= MAX_NAME_LEN
        && edge_ok(name.chars().next())
        && edge_ok(name.chars().last())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
}

/// Optimistic concurrency: a non-zero incoming version must match.
fn check_version<R: Resource>(current: &R, incoming: &R) -> StoreResult<()> {
    let expected = incoming.meta().resource_version;
    let actual = current.meta().resource_version;
    if expected != 0 && expected != actual {
        return Err(StoreError::Conflict {
            kind: R::KIND,
            key: current.key(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for MemoryStore<R> {
    async fn get(&self, ctx: &Context, key: &ObjectKey) -> StoreResult<R> {
        ctx.run(async {
            let state = self.state.read().await;
            state.current(key).cloned()
        })
        .await
    }

    async fn list(&self, ctx: &Context, params: &ListParams) -> StoreResult<Vec<R>> {
        ctx.run(async {
            let state = self.state.read().await;
            let namespace = params.namespace.as_deref();

            let Some(lookup) = &params.index else {
                return Ok(state
                    .objects
                    .values()
                    .filter(|o| namespace.is_none_or(|ns| o.meta().namespace == ns))
                    .cloned()
                    .collect());
            };

            let index = state
                .indexes
                .get(&lookup.index)
                .ok_or_else(|| StoreError::IndexNotFound(lookup.index.clone()))?;

            Ok(index
                .keys(namespace, &lookup.value)
                .iter()
                .filter_map(|key| state.objects.get(key).cloned())
                .collect())
        })
        .await
    }

    async fn create(&self, ctx: &Context, object: R) -> StoreResult<R> {
        ctx.run(async {
            validate(&object)?;

            let mut state = self.state.write().await;
            let key = object.key();
            if state.objects.contains_key(&key) {
                return Err(StoreError::AlreadyExists { kind: R::KIND, key });
            }

            let mut object = object;
            *object.status_mut() = R::Status::default();
            let meta = object.meta_mut();
            meta.uid = Some(ObjectUid::new());
            meta.creation_timestamp = Some(Utc::now());

            let created = self.commit(&mut state, key, object);
            debug!(kind = R::KIND, key = %created.key(), "Created object");
            Ok(created)
        })
        .await
    }

    async fn update(&self, ctx: &Context, object: R) -> StoreResult<R> {
        ctx.run(async {
            validate(&object)?;

            let mut state = self.state.write().await;
            let key = object.key();
            let current = state.current(&key)?;
            check_version(current, &object)?;

            let mut next = object;
            let meta = next.meta_mut();
            meta.uid = current.meta().uid;
            meta.creation_timestamp = current.meta().creation_timestamp;
            meta.resource_version = current.meta().resource_version;
            *next.status_mut() = current.status().clone();

            if next == *current {
                trace!(kind = R::KIND, key = %key, "Update is a no-op");
                return Ok(next);
            }

            Ok(self.commit(&mut state, key, next))
        })
        .await
    }

    async fn update_status(&self, ctx: &Context, object: R) -> StoreResult<R> {
        ctx.run(async {
            let mut state = self.state.write().await;
            let key = object.key();
            let current = state.current(&key)?;
            check_version(current, &object)?;

            if object.status() == current.status() {
                trace!(kind = R::KIND, key = %key, "Status update is a no-op");
                return Ok(current.clone());
            }

            let mut next = current.clone();
            *next.status_mut() = object.status().clone();
            Ok(self.commit(&mut state, key, next))
        })
        .await
    }

    async fn delete(&self, ctx: &Context, key: &ObjectKey) -> StoreResult<()> {
        ctx.run(async {
            let mut state = self.state.write().await;
            let removed = state.objects.remove(key).ok_or_else(|| StoreError::NotFound {
                kind: R::KIND,
                key: key.clone(),
            })?;
            state.reindex(Some(&removed), None);
            debug!(kind = R::KIND, key = %key, "Deleted object");
            self.publish(WatchEvent::Deleted(removed));
            Ok(())
        })
        .await
    }

    async fn register_index(&self, name: &str, derive: IndexFn<R>) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.indexes.contains_key(name) {
            return Err(StoreError::IndexExists(name.to_string()));
        }

        let mut index = Index {
            derive,
            postings: BTreeMap::new(),
        };
        for object in state.objects.values() {
            index.insert(object);
        }
        state.indexes.insert(name.to_string(), index);

        debug!(kind = R::KIND, index = name, "Registered index");
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<WatchEvent<R>> {
        self.events.subscribe()
    }
}

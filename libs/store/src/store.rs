//! The resource store interface.

use std::sync::Arc;

use async_trait::async_trait;
use brood_api::{ObjectKey, Resource};
use tokio::sync::broadcast;

use crate::context::Context;
use crate::error::StoreResult;

/// Derives secondary index values from an object.
///
/// Returning an empty vector leaves the object out of the index.
pub type IndexFn<R> = Arc<dyn Fn(&R) -> Vec<String> + Send + Sync>;

/// A change observed on the store.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent<R> {
    /// The object was created or modified; carries the stored state.
    Applied(R),
    /// The object was deleted; carries its last stored state.
    Deleted(R),
}

impl<R> WatchEvent<R> {
    pub fn object(&self) -> &R {
        match self {
            Self::Applied(object) | Self::Deleted(object) => object,
        }
    }
}

/// Lookup of a single value in a named index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMatch {
    pub index: String,
    pub value: String,
}

/// Filters for [`ResourceStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    /// Restrict to one namespace; `None` lists across all namespaces.
    pub namespace: Option<String>,

    /// Restrict to objects whose index values include the given value.
    pub index: Option<IndexMatch>,
}

impl ListParams {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            index: None,
        }
    }

    pub fn matching(mut self, index: impl Into<String>, value: impl Into<String>) -> Self {
        self.index = Some(IndexMatch {
            index: index.into(),
            value: value.into(),
        });
        self
    }
}

/// Typed access to stored objects of one kind.
///
/// Every operation takes a [`Context`] and fails with
/// [`StoreError::Cancelled`](crate::StoreError::Cancelled) or
/// [`StoreError::DeadlineExceeded`](crate::StoreError::DeadlineExceeded)
/// once the context is done.
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    /// Fetch one object. Missing objects yield `NotFound`.
    async fn get(&self, ctx: &Context, key: &ObjectKey) -> StoreResult<R>;

    /// List objects ordered by namespace, then name.
    async fn list(&self, ctx: &Context, params: &ListParams) -> StoreResult<Vec<R>>;

    /// Persist a new object. Store-managed metadata is assigned and any
    /// status on the input is discarded.
    async fn create(&self, ctx: &Context, object: R) -> StoreResult<R>;

    /// Replace metadata and spec. The stored status is preserved.
    async fn update(&self, ctx: &Context, object: R) -> StoreResult<R>;

    /// Replace only the status.
    async fn update_status(&self, ctx: &Context, object: R) -> StoreResult<R>;

    async fn delete(&self, ctx: &Context, key: &ObjectKey) -> StoreResult<()>;

    /// Register a named secondary index. Objects already stored are indexed
    /// immediately; later writes keep the index current.
    async fn register_index(&self, name: &str, derive: IndexFn<R>) -> StoreResult<()>;

    /// Subscribe to changes made after this call.
    fn watch(&self) -> broadcast::Receiver<WatchEvent<R>>;
}

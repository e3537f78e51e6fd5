//! A store wrapper that counts calls and injects failures.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use brood_api::{ObjectKey, Resource};
use brood_store::{
    Context, IndexFn, ListParams, MemoryStore, ResourceStore, StoreError, StoreResult, WatchEvent,
};
use tokio::sync::broadcast;

/// A store operation, for counting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    Get,
    List,
    Create,
    Update,
    UpdateStatus,
    Delete,
}

/// Snapshot of per-operation call counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts(BTreeMap<Op, usize>);

impl CallCounts {
    pub fn get(&self, op: Op) -> usize {
        self.0.get(&op).copied().unwrap_or(0)
    }

    /// Calls that would change stored state.
    pub fn writes(&self) -> usize {
        [Op::Create, Op::Update, Op::UpdateStatus, Op::Delete]
            .into_iter()
            .map(|op| self.get(op))
            .sum()
    }
}

#[derive(Debug)]
struct Fault {
    op: Op,
    /// 1-based call number to fail; `None` fails every call.
    call: Option<usize>,
    error: StoreError,
}

#[derive(Debug, Default)]
struct Recorder {
    counts: CallCounts,
    faults: Vec<Fault>,
}

/// Wraps a store, recording every call and failing selected ones.
///
/// Injected failures are returned before the inner store is touched, so a
/// failed write never lands.
pub struct RecordingStore<R: Resource> {
    inner: Arc<dyn ResourceStore<R>>,
    recorder: Mutex<Recorder>,
}

impl<R: Resource> RecordingStore<R> {
    /// Wraps a fresh [`MemoryStore`].
    pub fn new() -> Self {
        Self::wrap(Arc::new(MemoryStore::<R>::new()))
    }

    pub fn wrap(inner: Arc<dyn ResourceStore<R>>) -> Self {
        Self {
            inner,
            recorder: Mutex::new(Recorder::default()),
        }
    }

    /// The wrapped store, for setup that should not be counted.
    pub fn inner(&self) -> &Arc<dyn ResourceStore<R>> {
        &self.inner
    }

    pub fn counts(&self) -> CallCounts {
        self.recorder().counts.clone()
    }

    pub fn reset_counts(&self) {
        self.recorder().counts = CallCounts::default();
    }

    /// Fails the `call`-th invocation of `op` (1-based, counted from now on
    /// the running totals) with `error`.
    pub fn fail_nth(&self, op: Op, call: usize, error: StoreError) {
        let mut recorder = self.recorder();
        let call = recorder.counts.get(op) + call;
        recorder.faults.push(Fault {
            op,
            call: Some(call),
            error,
        });
    }

    /// Fails every invocation of `op` with `error`.
    pub fn fail_always(&self, op: Op, error: StoreError) {
        self.recorder().faults.push(Fault {
            op,
            call: None,
            error,
        });
    }

    pub fn clear_faults(&self) {
        self.recorder().faults.clear();
    }

    fn recorder(&self) -> MutexGuard<'_, Recorder> {
        // A panicking test thread must not hide counts from the others.
        self.recorder.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, op: Op) -> StoreResult<()> {
        let mut recorder = self.recorder();
        let count = recorder.counts.0.entry(op).or_insert(0);
        *count += 1;
        let call = *count;

        let fault = recorder
            .faults
            .iter()
            .find(|f| f.op == op && f.call.is_none_or(|n| n == call));
        match fault {
            Some(fault) => Err(fault.error.clone()),
            None => Ok(()),
        }
    }
}

impl<R: Resource> Default for RecordingStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for RecordingStore<R> {
    async fn get(&self, ctx: &Context, key: &ObjectKey) -> StoreResult<R> {
        self.record(Op::Get)?;
        self.inner.get(ctx, key).await
    }

    async fn list(&self, ctx: &Context, params: &ListParams) -> StoreResult<Vec<R>> {
        self.record(Op::List)?;
        self.inner.list(ctx, params).await
    }

    async fn create(&self, ctx: &Context, object: R) -> StoreResult<R> {
        self.record(Op::Create)?;
        self.inner.create(ctx, object).await
    }

    async fn update(&self, ctx: &Context, object: R) -> StoreResult<R> {
        self.record(Op::Update)?;
        self.inner.update(ctx, object).await
    }

    async fn update_status(&self, ctx: &Context, object: R) -> StoreResult<R> {
        self.record(Op::UpdateStatus)?;
        self.inner.update_status(ctx, object).await
    }

    async fn delete(&self, ctx: &Context, key: &ObjectKey) -> StoreResult<()> {
        self.record(Op::Delete)?;
        self.inner.delete(ctx, key).await
    }

    async fn register_index(&self, name: &str, derive: IndexFn<R>) -> StoreResult<()> {
        self.inner.register_index(name, derive).await
    }

    fn watch(&self) -> broadcast::Receiver<WatchEvent<R>> {
        self.inner.watch()
    }
}

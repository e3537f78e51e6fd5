//! # brood-store
//!
//! The resource store the brood controller reads and writes through.
//!
//! - [`ResourceStore`] is the capability the reconciler depends on: get,
//!   list (optionally through a named secondary index), create, update,
//!   status-only update, delete, index registration and watch.
//! - [`MemoryStore`] is an in-process implementation with incrementally
//!   maintained indexes and a broadcast watch stream.
//! - [`Context`] bounds every operation with an optional deadline and a
//!   cancellation signal.
//! - [`GarbageCollector`] deletes dependents once their owner is gone.

mod context;
mod error;
mod gc;
mod memory;
mod ops;
mod store;

pub use context::{CancelHandle, Context};
pub use error::{StoreError, StoreResult};
pub use gc::GarbageCollector;
pub use memory::{MemoryStore, MAX_NAME_LEN};
pub use ops::{create_or_update, OperationResult, StoreResultExt};
pub use store::{IndexFn, IndexMatch, ListParams, ResourceStore, WatchEvent};

//! # brood-testing
//!
//! Shared test support: [`RecordingStore`] wraps any store to count calls
//! per operation and inject failures on chosen calls, and the fixtures seed
//! birds and eggs the way the controller would write them.

mod fixtures;
mod recording;

pub use fixtures::{
    init_tracing, seed_bird, seed_owned_egg, seed_owned_eggs, seed_unowned_egg, NAMESPACE,
};
pub use recording::{CallCounts, Op, RecordingStore};

//! Application state shared across request handlers.

use std::sync::Arc;

use brood_api::{Bird, Egg};
use brood_store::ResourceStore;

use crate::owner_index::OwnerIndexConfig;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    birds: Arc<dyn ResourceStore<Bird>>,
    eggs: Arc<dyn ResourceStore<Egg>>,
    owner_index: OwnerIndexConfig,
}

impl AppState {
    pub fn new(
        birds: Arc<dyn ResourceStore<Bird>>,
        eggs: Arc<dyn ResourceStore<Egg>>,
        owner_index: OwnerIndexConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                birds,
                eggs,
                owner_index,
            }),
        }
    }

    pub fn birds(&self) -> &dyn ResourceStore<Bird> {
        self.inner.birds.as_ref()
    }

    pub fn eggs(&self) -> &dyn ResourceStore<Egg> {
        self.inner.eggs.as_ref()
    }

    pub fn owner_index(&self) -> &OwnerIndexConfig {
        &self.inner.owner_index
    }
}

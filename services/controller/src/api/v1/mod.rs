//! API v1 routes.

mod birds;
mod eggs;

use axum::Router;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

pub use birds::ApplyBirdRequest;

/// Create API v1 routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(birds::routes())
        .merge(eggs::routes())
}

/// Response for list endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

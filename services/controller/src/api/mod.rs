//! HTTP API handlers and routing.

pub mod error;
mod health;
mod request_id;
mod v1;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use health::{Health, HealthResponse, StoreCheck};
pub use request_id::RequestContext;
pub use v1::{ApplyBirdRequest, ListResponse};

/// Create the main API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .nest("/v1", v1::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

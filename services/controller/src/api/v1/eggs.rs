//! Egg API endpoints. Eggs are read-only over HTTP.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use brood_api::{Egg, ObjectKey};
use brood_store::ListParams;

use super::birds::{store_ctx, store_error};
use super::ListResponse;
use crate::api::error::ApiError;
use crate::api::request_id::RequestContext;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/namespaces/{namespace}/eggs", get(list_eggs))
        .route("/namespaces/{namespace}/eggs/{name}", get(get_egg))
}

/// GET /v1/namespaces/{namespace}/eggs
async fn list_eggs(
    State(state): State<AppState>,
    request: RequestContext,
    Path(namespace): Path<String>,
) -> Result<Json<ListResponse<Egg>>, ApiError> {
    let eggs = state
        .eggs()
        .list(&store_ctx(), &ListParams::in_namespace(namespace))
        .await
        .map_err(store_error(&request))?;
    Ok(Json(eggs.into()))
}

/// GET /v1/namespaces/{namespace}/eggs/{name}
async fn get_egg(
    State(state): State<AppState>,
    request: RequestContext,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<Egg>, ApiError> {
    let egg = state
        .eggs()
        .get(&store_ctx(), &ObjectKey::new(namespace, name))
        .await
        .map_err(store_error(&request))?;
    Ok(Json(egg))
}

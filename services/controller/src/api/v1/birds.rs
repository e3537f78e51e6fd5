//! Bird API endpoints.

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use brood_api::{Bird, Egg, ObjectKey};
use brood_store::{create_or_update, Context, ListParams, OperationResult, StoreError};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ListResponse;
use crate::api::error::ApiError;
use crate::api::request_id::RequestContext;
use crate::state::AppState;

/// Upper bound on the store calls made by one request.
pub(super) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/namespaces/{namespace}/birds", get(list_birds))
        .route(
            "/namespaces/{namespace}/birds/{name}",
            get(get_bird).put(apply_bird).delete(delete_bird),
        )
        .route("/namespaces/{namespace}/birds/{name}/eggs", get(list_bird_eggs))
}

/// Desired state submitted by `PUT`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyBirdRequest {
    /// Desired egg count; `null` or absent means none.
    #[serde(default)]
    pub egg_numbers: Option<i32>,
}

pub(super) fn store_ctx() -> Context {
    Context::background().with_timeout(REQUEST_TIMEOUT)
}

pub(super) fn store_error(request: &RequestContext) -> impl Fn(StoreError) -> ApiError + '_ {
    move |e| ApiError::from(e).with_request_id(&request.request_id)
}

/// GET /v1/namespaces/{namespace}/birds
async fn list_birds(
    State(state): State<AppState>,
    request: RequestContext,
    Path(namespace): Path<String>,
) -> Result<Json<ListResponse<Bird>>, ApiError> {
    let birds = state
        .birds()
        .list(&store_ctx(), &ListParams::in_namespace(namespace))
        .await
        .map_err(store_error(&request))?;
    Ok(Json(birds.into()))
}

/// GET /v1/namespaces/{namespace}/birds/{name}
async fn get_bird(
    State(state): State<AppState>,
    request: RequestContext,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<Bird>, ApiError> {
    let bird = state
        .birds()
        .get(&store_ctx(), &ObjectKey::new(namespace, name))
        .await
        .map_err(store_error(&request))?;
    Ok(Json(bird))
}

/// PUT /v1/namespaces/{namespace}/birds/{name}
///
/// Creates the bird or replaces its spec. Status is left to the controller.
async fn apply_bird(
    State(state): State<AppState>,
    request: RequestContext,
    Path((namespace, name)): Path<(String, String)>,
    body: Result<Json<ApplyBirdRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Bird>), ApiError> {
    let Json(req) = body.map_err(|rejection| {
        ApiError::bad_request("invalid_body", rejection.body_text())
            .with_request_id(&request.request_id)
    })?;

    if req.egg_numbers.is_some_and(|n| n < 0) {
        return Err(ApiError::bad_request(
            "invalid_egg_numbers",
            "eggNumbers must not be negative",
        )
        .with_request_id(request.request_id));
    }

    let (bird, result) = create_or_update(
        &store_ctx(),
        state.birds(),
        Bird::new(&namespace, &name, None),
        |bird| {
            bird.spec.egg_numbers = req.egg_numbers;
            Ok::<_, StoreError>(())
        },
    )
    .await
    .map_err(store_error(&request))?;

    info!(
        namespace = %namespace,
        name = %name,
        egg_numbers = ?req.egg_numbers,
        ?result,
        "Applied bird"
    );

    let status = match result {
        OperationResult::Created => StatusCode::CREATED,
        OperationResult::Updated | OperationResult::Unchanged => StatusCode::OK,
    };
    Ok((status, Json(bird)))
}

/// DELETE /v1/namespaces/{namespace}/birds/{name}
///
/// Eggs are removed by the garbage collector.
async fn delete_bird(
    State(state): State<AppState>,
    request: RequestContext,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let key = ObjectKey::new(namespace, name);
    state
        .birds()
        .delete(&store_ctx(), &key)
        .await
        .map_err(store_error(&request))?;

    info!(key = %key, "Deleted bird");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/namespaces/{namespace}/birds/{name}/eggs
async fn list_bird_eggs(
    State(state): State<AppState>,
    request: RequestContext,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<ListResponse<Egg>>, ApiError> {
    let ctx = store_ctx();
    let key = ObjectKey::new(namespace, name);

    // 404 for unknown birds rather than an empty list.
    state
        .birds()
        .get(&ctx, &key)
        .await
        .map_err(store_error(&request))?;

    let eggs = state
        .eggs()
        .list(&ctx, &state.owner_index().list_params(&key))
        .await
        .map_err(store_error(&request))?;
    Ok(Json(eggs.into()))
}

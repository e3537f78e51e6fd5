//! Liveness and readiness endpoints.

use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use brood_store::{Context, ListParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// How long readiness waits on the store.
const READINESS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Ok,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: Health,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreCheck>,
}

/// Outcome of listing birds against the store.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreCheck {
    pub reachable: bool,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birds: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/livez", get(livez))
}

impl HealthResponse {
    fn new(status: Health, store: Option<StoreCheck>) -> Self {
        Self {
            status,
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            store,
        }
    }
}

/// 200 whenever the process serves requests.
async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse::new(Health::Ok, None))
}

/// 503 unless the store lists birds within [`READINESS_TIMEOUT`].
async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let ctx = Context::background().with_timeout(READINESS_TIMEOUT);
    let started = Instant::now();
    let result = state.birds().list(&ctx, &ListParams::all()).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(birds) => {
            let check = StoreCheck {
                reachable: true,
                latency_ms,
                birds: Some(birds.len()),
                error: None,
            };
            (StatusCode::OK, Json(HealthResponse::new(Health::Ok, Some(check))))
        }
        Err(e) => {
            let check = StoreCheck {
                reachable: false,
                latency_ms,
                birds: None,
                error: Some(e.to_string()),
            };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::new(Health::Degraded, Some(check))),
            )
        }
    }
}

async fn livez() -> StatusCode {
    StatusCode::OK
}

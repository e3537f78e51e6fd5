//! HTTP API against in-memory stores.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use brood_api::{Bird, Egg};
use brood_controller::api::{self, error::ProblemDetails, Health, HealthResponse, ListResponse};
use brood_controller::owner_index::OwnerIndexConfig;
use brood_controller::state::AppState;
use brood_store::{MemoryStore, ResourceStore};
use brood_testing::{seed_bird, seed_owned_egg, seed_unowned_egg};
use serde::de::DeserializeOwned;
use tower::ServiceExt;

struct TestApi {
    router: Router,
    birds: Arc<MemoryStore<Bird>>,
    eggs: Arc<MemoryStore<Egg>>,
}

async fn test_api() -> TestApi {
    let birds = Arc::new(MemoryStore::<Bird>::new());
    let eggs = Arc::new(MemoryStore::<Egg>::new());
    let index = OwnerIndexConfig::default();
    index.register(eggs.as_ref()).await.unwrap();

    let router = api::create_router(AppState::new(birds.clone(), eggs.clone(), index));
    TestApi { router, birds, eggs }
}

impl TestApi {
    async fn send(&self, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn json<T: DeserializeOwned>(&self, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, T) {
        let (status, bytes) = self.send(method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

#[tokio::test]
async fn health_endpoints() {
    let api = test_api().await;

    let (status, health): (_, HealthResponse) = api.json(Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health.status, Health::Ok);
    assert_eq!(health.service, "brood-controller");

    let (status, _) = api.send(Method::GET, "/livez", None).await;
    assert_eq!(status, StatusCode::OK);

    seed_bird(api.birds.as_ref(), "robin", None).await;
    let (status, ready): (_, HealthResponse) = api.json(Method::GET, "/readyz", None).await;
    assert_eq!(status, StatusCode::OK);
    let check = ready.store.unwrap();
    assert!(check.reachable);
    assert_eq!(check.birds, Some(1));
}

#[tokio::test]
async fn apply_creates_then_updates() {
    let api = test_api().await;
    let uri = "/v1/namespaces/default/birds/robin";

    let (status, bird): (_, Bird) = api
        .json(Method::PUT, uri, Some(serde_json::json!({ "eggNumbers": 3 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bird.spec.egg_numbers, Some(3));
    assert!(bird.metadata.uid.is_some());

    let (status, bird): (_, Bird) = api
        .json(Method::PUT, uri, Some(serde_json::json!({ "eggNumbers": null })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bird.spec.egg_numbers, None);

    let (status, fetched): (_, Bird) = api.json(Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, bird);
}

#[tokio::test]
async fn apply_rejects_negative_counts_and_bad_names() {
    let api = test_api().await;

    let (status, problem): (_, ProblemDetails) = api
        .json(
            Method::PUT,
            "/v1/namespaces/default/birds/robin",
            Some(serde_json::json!({ "eggNumbers": -1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem.code, "invalid_egg_numbers");
    assert!(problem.request_id.starts_with("req_"));

    let (status, problem): (_, ProblemDetails) = api
        .json(
            Method::PUT,
            "/v1/namespaces/default/birds/Robin",
            Some(serde_json::json!({ "eggNumbers": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem.code, "invalid_object");
}

#[tokio::test]
async fn missing_bird_is_problem_json() {
    let api = test_api().await;

    let request = Request::builder()
        .uri("/v1/namespaces/default/birds/ghost")
        .header("x-request-id", "req-from-caller")
        .body(Body::empty())
        .unwrap();
    let response = api.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let problem: ProblemDetails = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(problem.code, "not_found");
    assert_eq!(problem.request_id, "req-from-caller");
}

#[tokio::test]
async fn malformed_apply_body_is_problem_json() {
    let api = test_api().await;

    for (content_type, body) in [
        ("application/json", r#"{"eggNumbers":"three"}"#),
        ("application/json", "{not json"),
        ("text/plain", r#"{"eggNumbers":1}"#),
    ] {
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/v1/namespaces/default/birds/robin")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        let response = api.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let problem: ProblemDetails = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(problem.code, "invalid_body");
        assert!(problem.request_id.starts_with("req_"));
    }

    assert!(api.birds.is_empty().await);
}

#[tokio::test]
async fn lists_are_namespaced() {
    let api = test_api().await;
    seed_bird(api.birds.as_ref(), "robin", Some(1)).await;
    seed_bird(api.birds.as_ref(), "wren", None).await;

    let (status, list): (_, ListResponse<Bird>) =
        api.json(Method::GET, "/v1/namespaces/default/birds", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.total, 2);
    assert_eq!(list.items[0].metadata.name, "robin");

    let (_, list): (_, ListResponse<Bird>) =
        api.json(Method::GET, "/v1/namespaces/other/birds", None).await;
    assert_eq!(list.total, 0);
}

#[tokio::test]
async fn bird_eggs_lists_only_owned() {
    let api = test_api().await;
    let robin = seed_bird(api.birds.as_ref(), "robin", Some(1)).await;
    seed_owned_egg(api.eggs.as_ref(), &robin, "robin-egg").await;
    seed_unowned_egg(api.eggs.as_ref(), "stray").await;

    let (status, owned): (_, ListResponse<Egg>) = api
        .json(Method::GET, "/v1/namespaces/default/birds/robin/eggs", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(owned.total, 1);
    assert_eq!(owned.items[0].metadata.name, "robin-egg");

    let (_, all): (_, ListResponse<Egg>) =
        api.json(Method::GET, "/v1/namespaces/default/eggs", None).await;
    assert_eq!(all.total, 2);

    let (status, egg): (_, Egg) = api
        .json(Method::GET, "/v1/namespaces/default/eggs/robin-egg", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(egg.spec.parent, "robin");

    let (status, _) = api
        .send(Method::GET, "/v1/namespaces/default/birds/ghost/eggs", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_bird() {
    let api = test_api().await;
    seed_bird(api.birds.as_ref(), "robin", Some(1)).await;
    let uri = "/v1/namespaces/default/birds/robin";

    let (status, _) = api.send(Method::DELETE, uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(api.birds.is_empty().await);

    let (status, _) = api.send(Method::DELETE, uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

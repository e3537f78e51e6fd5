//! HTTP client for the controller API.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::CliError;

/// API client for communicating with the controller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CliError> {
        let response = self.client.get(self.url(path)).send().await?;

        self.handle_response(response).await
    }

    /// Make a PUT request, returning the body and whether the server
    /// created the object.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(T, bool), CliError> {
        let response = self.client.put(self.url(path)).json(body).send().await?;
        let created = response.status() == reqwest::StatusCode::CREATED;

        Ok((self.handle_response(response).await?, created))
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<(), CliError> {
        let response = self.client.delete(self.url(path)).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            self.handle_error(response).await
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CliError> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to parse response: {}", e)))
        } else {
            self.handle_error(response).await
        }
    }

    async fn handle_error<T>(&self, response: reqwest::Response) -> Result<T, CliError> {
        let status = response.status().as_u16();

        let problem: ProblemResponse = response.json().await.unwrap_or_else(|_| ProblemResponse {
            code: "unknown".to_string(),
            detail: "Unknown error".to_string(),
            request_id: None,
        });

        Err(CliError::api(
            status,
            problem.code,
            problem.detail,
            problem.request_id,
        ))
    }
}

/// Problem details body returned by the controller on failure.
#[derive(Debug, Deserialize)]
struct ProblemResponse {
    code: String,
    detail: String,
    #[serde(default)]
    request_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use brood_api::Bird;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_building() {
        let client = ApiClient::new("http://localhost:8080/").unwrap();
        assert_eq!(
            client.url("/v1/namespaces/default/birds"),
            "http://localhost:8080/v1/namespaces/default/birds"
        );
    }

    #[tokio::test]
    async fn put_reports_creation() {
        let server = MockServer::start().await;
        let bird = Bird::new("default", "robin", Some(2));
        Mock::given(method("PUT"))
            .and(path("/v1/namespaces/default/birds/robin"))
            .and(body_json(serde_json::json!({ "eggNumbers": 2 })))
            .respond_with(ResponseTemplate::new(201).set_body_json(&bird))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let (returned, created): (Bird, bool) = client
            .put(
                "/v1/namespaces/default/birds/robin",
                &serde_json::json!({ "eggNumbers": 2 }),
            )
            .await
            .unwrap();

        assert!(created);
        assert_eq!(returned, bird);
    }

    #[tokio::test]
    async fn problem_bodies_become_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/namespaces/default/birds/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "type": "https://bird.my.domain/problems/not_found",
                "title": "Not Found",
                "status": 404,
                "detail": "Bird default/ghost not found",
                "code": "not_found",
                "request_id": "req_01",
                "retryable": false
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client
            .get::<Bird>("/v1/namespaces/default/birds/ghost")
            .await
            .unwrap_err();

        match err {
            CliError::Api {
                status,
                code,
                message,
                request_id,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code, "not_found");
                assert_eq!(message, "Bird default/ghost not found");
                assert_eq!(request_id.as_deref(), Some("req_01"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_error_body_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client
            .delete("/v1/namespaces/default/birds/robin")
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Api { status: 500, ref code, .. } if code == "unknown"));
    }
}

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use brood_store::StoreError;
use serde::{Deserialize, Serialize};

/// RFC 7807 problem body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    pub code: String,
    pub request_id: String,
    pub retryable: bool,
}

impl ProblemDetails {
    fn new(status: StatusCode, code: impl Into<String>, detail: impl Into<String>) -> Self {
        let code = code.into();
        let title = status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string();
        Self {
            r#type: format!("https://bird.my.domain/problems/{code}"),
            title,
            status: status.as_u16(),
            detail: detail.into(),
            instance: None,
            code,
            request_id: "unknown".to_string(),
            retryable: false,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub problem: Box<ProblemDetails>,
}

impl ApiError {
    fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        let problem = Box::new(ProblemDetails::new(status, code, message));
        Self { status, problem }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    pub fn service_unavailable(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, code, message).retryable()
    }

    pub fn gateway_timeout(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, code, message).retryable()
    }

    pub fn retryable(mut self) -> Self {
        self.problem.retryable = true;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        let request_id = request_id.into();
        if self.problem.instance.is_none() {
            self.problem.instance = Some(request_id.clone());
        }
        self.problem.request_id = request_id;
        self
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NotFound { .. } => Self::not_found("not_found", message),
            StoreError::AlreadyExists { .. } => Self::conflict("already_exists", message),
            StoreError::Conflict { .. } => Self::conflict("resource_version_conflict", message).retryable(),
            StoreError::Invalid { .. } => Self::bad_request("invalid_object", message),
            StoreError::Cancelled | StoreError::DeadlineExceeded => {
                Self::gateway_timeout("store_timeout", message)
            }
            StoreError::Unavailable(_) => Self::service_unavailable("store_unavailable", message),
            StoreError::IndexNotFound(_) | StoreError::IndexExists(_) => {
                Self::internal("index_error", message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.problem)).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use brood_api::ObjectKey;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(StoreError::NotFound { kind: "Bird", key: ObjectKey::new("default", "robin") }, StatusCode::NOT_FOUND, false)]
    #[case(StoreError::Conflict { kind: "Bird", key: ObjectKey::new("default", "robin"), expected: 1, actual: 2 }, StatusCode::CONFLICT, true)]
    #[case(StoreError::Invalid { kind: "Bird", message: "bad".into() }, StatusCode::BAD_REQUEST, false)]
    #[case(StoreError::DeadlineExceeded, StatusCode::GATEWAY_TIMEOUT, true)]
    #[case(StoreError::Unavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE, true)]
    fn test_store_error_mapping(
        #[case] err: StoreError,
        #[case] status: StatusCode,
        #[case] retryable: bool,
    ) {
        let api = ApiError::from(err);
        assert_eq!(api.status, status);
        assert_eq!(api.problem.status, status.as_u16());
        assert_eq!(api.problem.retryable, retryable);
    }

    #[test]
    fn test_problem_json_content_type() {
        let response = ApiError::not_found("not_found", "gone")
            .with_request_id("req_1")
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }
}

//! Request id extraction.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use brood_id::RequestId;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// The caller's `x-request-id`, or a fresh id when absent.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| RequestId::new().to_string());

        Ok(Self { request_id })
    }
}

//! Forwarding to the AI service.
//!
//! The upstream is opaque: a JSON body goes out, and whatever comes back is
//! streamed to the client with its status and content type intact.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Method, Request, Uri};
use axum::response::Response;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use serde_json::Value;

use crate::http::error::ApiError;
use crate::observability::metrics;

#[derive(Debug, Clone)]
pub struct Upstream {
    base: String,
    timeout: Duration,
}

impl Upstream {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Absolute URI for a path on the upstream.
    pub fn uri_for(&self, path: &str) -> Result<Uri, ApiError> {
        format!("{}{path}", self.base)
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| ApiError::Upstream(e.to_string()))
    }

    /// POST `payload` to `path` and relay the answer.
    pub async fn forward(
        &self,
        client: &Client<HttpConnector, Body>,
        route: &str,
        path: &str,
        payload: &Value,
        request_id: Option<&str>,
    ) -> Result<Response, ApiError> {
        let start = Instant::now();
        let uri = self.uri_for(path)?;

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = request_id {
            builder = builder.header("x-request-id", id);
        }
        let request = builder
            .body(Body::from(payload.to_string()))
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        let response = match tokio::time::timeout(self.timeout, client.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                metrics::record_upstream(route, 502, start);
                return Err(ApiError::Upstream(e.to_string()));
            }
            Err(_) => {
                metrics::record_upstream(route, 504, start);
                return Err(ApiError::Upstream(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        let status = response.status();
        metrics::record_upstream(route, status.as_u16(), start);
        tracing::debug!(route, status = %status, "Upstream answered");

        let (parts, body) = response.into_parts();
        let mut relayed = Response::new(Body::new(body));
        *relayed.status_mut() = parts.status;
        if let Some(content_type) = parts.headers.get(header::CONTENT_TYPE) {
            relayed
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type.clone());
        }
        Ok(relayed)
    }
}

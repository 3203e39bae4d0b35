//! API error responses.
//!
//! Every error renders as JSON with an `error` field. Nothing internal
//! (upstream errors, config details) reaches the client.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use crate::security::RateLimitDecision;

pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Invalid request")]
    InvalidRequest,

    #[error("Bad request")]
    BadRequest(&'static str),

    #[error("Rate limit exceeded")]
    RateLimited {
        limit: u32,
        decision: RateLimitDecision,
    },

    #[error("Server misconfigured")]
    Misconfigured,

    #[error("Not found")]
    NotFound,

    #[error("Service unavailable")]
    UpstreamUnavailable,

    #[error("Bad gateway")]
    Upstream(String),
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidPassword => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn body(&self) -> Value {
        const RATE_LIMITED_MESSAGE: &str =
            "You have exceeded the maximum number of requests. Please try again later.";

        let error = self.to_string();
        match self {
            Self::BadRequest(message) => json!({ "error": error, "message": message }),
            Self::RateLimited { decision, .. } => json!({
                "error": error,
                "message": RATE_LIMITED_MESSAGE,
                "retryAfter": decision.reset_at,
            }),
            Self::UpstreamUnavailable => json!({
                "error": error,
                "message": "The AI service is not configured.",
            }),
            Self::Upstream(_) => json!({
                "error": error,
                "message": "Failed to get a response from the AI service.",
            }),
            _ => json!({ "error": error }),
        }
    }
}

fn header_value(value: impl std::fmt::Display) -> HeaderValue {
    HeaderValue::try_from(value.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Upstream(detail) = &self {
            tracing::error!(error = %detail, "Upstream request failed");
        }

        let mut response = (self.status_code(), Json(self.body())).into_response();

        if let Self::RateLimited { limit, decision } = &self {
            let headers = response.headers_mut();
            headers.insert(header::RETRY_AFTER, header_value(decision.retry_after));
            headers.insert(RATE_LIMIT_LIMIT, header_value(limit));
            headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("0"));
            headers.insert(RATE_LIMIT_RESET, header_value(decision.reset_at));
        }

        response
    }
}

/// Add quota headers to a successful response.
pub fn apply_rate_limit_headers(
    headers: &mut axum::http::HeaderMap,
    limit: u32,
    decision: &RateLimitDecision,
) {
    headers.insert(RATE_LIMIT_LIMIT, header_value(limit));
    headers.insert(RATE_LIMIT_REMAINING, header_value(decision.remaining));
    headers.insert(RATE_LIMIT_RESET, header_value(decision.reset_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Misconfigured.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::UpstreamUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Upstream("refused".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_unauthorized_body_is_exact() {
        assert_eq!(ApiError::Unauthorized.body(), json!({ "error": "Unauthorized" }));
    }

    #[test]
    fn test_upstream_detail_not_exposed() {
        let body = ApiError::Upstream("connection refused 10.0.0.7".into()).body();
        assert!(!body.to_string().contains("10.0.0.7"));
    }

    #[test]
    fn test_rate_limited_response_headers() {
        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_at: 1_700_003_600,
            retry_after: 42,
        };
        let response = ApiError::RateLimited {
            limit: 30,
            decision,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers();
        assert_eq!(headers[header::RETRY_AFTER], "42");
        assert_eq!(headers[RATE_LIMIT_REMAINING], "0");
        assert_eq!(headers[RATE_LIMIT_RESET], "1700003600");
        assert_eq!(headers[RATE_LIMIT_LIMIT], "30");
    }
}

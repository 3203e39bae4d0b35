use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub environment: &'static str,
    pub secret_configured: bool,
    pub edge_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct RateLimitSummary {
    pub tracked_keys: usize,
    pub sweeping: bool,
    pub max_requests: u32,
    pub window_secs: u64,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let inner = state.current();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        environment: inner.config.environment.as_str(),
        secret_configured: state.secret().current().is_some(),
        edge_enabled: inner.config.edge.enabled,
    })
}

pub async fn get_rate_limits(State(state): State<AppState>) -> Json<RateLimitSummary> {
    let settings = state.limiter.settings();
    Json(RateLimitSummary {
        tracked_keys: state.limiter.tracked_keys(),
        sweeping: state.limiter.is_sweeping(),
        max_requests: settings.max_requests,
        window_secs: settings.window.as_secs(),
    })
}

/// Forget a client's window so its next request starts fresh.
pub async fn reset_rate_limit(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> StatusCode {
    if state.limiter.reset(&key) {
        tracing::info!(client = %key, "Rate limit window reset by operator");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header::AUTHORIZATION, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::admin::setup_admin_router;
    use crate::auth::SharedSecret;
    use crate::clock::SystemClock;
    use crate::config::SiteConfig;

    fn state() -> AppState {
        let mut config = SiteConfig::default();
        config.admin.enabled = true;
        config.admin.api_key = "operator-key".to_string();
        AppState::new(
            config,
            Arc::new(SharedSecret::new("s3cr3t")),
            Arc::new(SharedSecret::unset()),
            Arc::new(SystemClock),
        )
    }

    fn request(method: &str, uri: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_requires_bearer_key() {
        let app = setup_admin_router(state());
        let response = app
            .clone()
            .oneshot(request("GET", "/admin/status", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(request("GET", "/admin/status", Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(request("GET", "/admin/status", Some("operator-key")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reset_rate_limit() {
        let state = state();
        state.limiter.check("203.0.113.9");
        let app = setup_admin_router(state.clone());

        let response = app
            .clone()
            .oneshot(request("DELETE", "/admin/rate-limits/203.0.113.9", Some("operator-key")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.limiter.tracked_keys(), 0);

        let response = app
            .oneshot(request("DELETE", "/admin/rate-limits/203.0.113.9", Some("operator-key")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

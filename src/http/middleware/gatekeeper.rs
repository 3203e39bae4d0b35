//! Edge gatekeeper middleware.
//! Rejects obviously unauthenticated traffic before routing.

use axum::{
    body::Body,
    extract::State,
    http::{header::COOKIE, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::observability::metrics;
use crate::security::EdgeDecision;

pub async fn edge_gatekeeper(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let current = state.current();
    if !current.config.edge.enabled {
        return next.run(req).await;
    }

    // Multiple Cookie headers are folded the way HTTP/2 splits them.
    let cookies = req
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    let cookie_header = (!cookies.is_empty()).then_some(cookies.as_str());

    let decision = current
        .gatekeeper
        .decide(req.uri().path(), req.uri().query(), cookie_header);
    metrics::record_edge_decision(decision.outcome());

    match decision {
        EdgeDecision::Pass(_) => next.run(req).await,
        EdgeDecision::Unauthorized => {
            tracing::debug!(path = %req.uri().path(), "Edge rejected API request");
            ApiError::Unauthorized.into_response()
        }
        EdgeDecision::Redirect { location } => {
            tracing::debug!(path = %req.uri().path(), %location, "Edge redirecting to login");
            Redirect::temporary(&location).into_response()
        }
    }
}

//! Request extractors for protected handlers.
//!
//! [`Authenticated`] is the authoritative session check; [`Quota`] consumes
//! one request from the caller's rate-limit window. Declare them in that
//! order so unauthenticated callers never touch the limiter.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};

use crate::http::error::{apply_rate_limit_headers, ApiError};
use crate::http::state::AppState;
use crate::observability::metrics;
use crate::security::RateLimitDecision;

/// Proof that the request carried a valid session cookie.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated;

/// Rejection for [`Authenticated`]: JSON 401 on API paths, a redirect to
/// the login page everywhere else.
#[derive(Debug)]
pub enum AuthRejection {
    Unauthorized,
    Redirect(String),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => ApiError::Unauthorized.into_response(),
            Self::Redirect(location) => Redirect::temporary(&location).into_response(),
        }
    }
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = state.current();
        if current.sessions.authenticate(&parts.headers) {
            return Ok(Authenticated);
        }

        let gate = &current.gatekeeper;
        if gate.is_api(parts.uri.path()) {
            Err(AuthRejection::Unauthorized)
        } else {
            Err(AuthRejection::Redirect(gate.login_location(parts.uri.query())))
        }
    }
}

/// Identify the caller for rate limiting.
///
/// First non-empty `X-Forwarded-For` entry, then `X-Real-IP`, then the peer
/// address. Forwarded headers are ignored unless `trust_forwarded` is set.
pub fn client_key(headers: &HeaderMap, peer: Option<IpAddr>, trust_forwarded: bool) -> String {
    if trust_forwarded {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = real_ip {
            return ip.to_string();
        }
    }

    peer.map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// One admitted request against the caller's quota.
///
/// `decision` is `None` when rate limiting is disabled.
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    pub limit: u32,
    pub decision: Option<RateLimitDecision>,
}

impl Quota {
    /// Attach the `X-RateLimit-*` headers to a response.
    pub fn apply(&self, response: &mut Response) {
        if let Some(decision) = &self.decision {
            apply_rate_limit_headers(response.headers_mut(), self.limit, decision);
        }
    }
}

impl FromRequestParts<AppState> for Quota {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = state.current();
        let limit = state.limiter.settings().max_requests;
        if !current.config.rate_limit.enabled {
            return Ok(Quota {
                limit,
                decision: None,
            });
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let key = client_key(
            &parts.headers,
            peer,
            current.config.rate_limit.trust_forwarded_headers,
        );

        let decision = state.limiter.check(&key);
        if decision.allowed {
            return Ok(Quota {
                limit,
                decision: Some(decision),
            });
        }

        metrics::record_rate_limited(parts.uri.path());
        Err(ApiError::RateLimited { limit, decision })
    }
}

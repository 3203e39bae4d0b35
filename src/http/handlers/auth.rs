//! Login, logout and session status.

use axum::{
    body::Bytes,
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use subtle::ConstantTimeEq;

use crate::auth::AuthError;
use crate::http::error::ApiError;
use crate::http::extract::Authenticated;
use crate::http::state::AppState;

/// `POST /api/auth/login` with `{"password": "..."}`.
pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let body: Value = serde_json::from_slice(&body).map_err(|_| ApiError::InvalidRequest)?;

    let Some(expected) = state.password.current() else {
        tracing::error!("Site password is not configured");
        return Err(ApiError::Misconfigured);
    };

    let matches = body
        .get("password")
        .and_then(Value::as_str)
        .is_some_and(|given| bool::from(given.as_bytes().ct_eq(expected.as_bytes())));
    if !matches {
        tracing::warn!("Login attempt with invalid password");
        return Err(ApiError::InvalidPassword);
    }

    let current = state.current();
    let mut response = Json(json!({ "success": true })).into_response();
    current
        .sessions
        .set_session_cookie(response.headers_mut())
        .map_err(session_error)?;

    tracing::info!("Session created");
    Ok(response)
}

/// `POST /api/auth/logout`. Always clears the cookie.
pub async fn logout(State(state): State<AppState>) -> Result<Response, ApiError> {
    let cookie = state
        .current()
        .sessions
        .destroy_session()
        .map_err(session_error)?;
    Ok(([(SET_COOKIE, cookie)], Json(json!({ "success": true }))).into_response())
}

/// `GET /api/auth/session`.
pub async fn session_status(_: Authenticated) -> Json<Value> {
    Json(json!({ "authenticated": true }))
}

fn session_error(error: AuthError) -> ApiError {
    tracing::error!(error = %error, "Cannot issue session cookie");
    ApiError::Misconfigured
}

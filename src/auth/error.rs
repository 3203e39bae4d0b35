//! Authentication error types.
//!
//! Only operator-facing failures live here. A bad or tampered credential is
//! not an error: verification just answers `false`.

use axum::http::header::InvalidHeaderValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No signing secret is configured. Sessions can neither be issued nor verified.
    #[error("session signing secret is not configured")]
    MissingSecret,

    /// The session cookie could not be encoded as a header value.
    #[error("invalid session cookie: {0}")]
    InvalidCookie(#[from] InvalidHeaderValue),
}

//! Authoritative session checks.
//!
//! Every protected handler goes through [`SessionManager::authenticate`],
//! whatever the edge gatekeeper decided earlier in the stack.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};

use crate::auth::cookie::{find_cookie, CookieSettings};
use crate::auth::error::AuthError;
use crate::auth::token::TokenCodec;
use crate::observability::metrics;

/// Issues, destroys and verifies the session cookie.
#[derive(Debug, Clone)]
pub struct SessionManager {
    codec: TokenCodec,
    cookie: CookieSettings,
}

impl SessionManager {
    pub fn new(codec: TokenCodec, cookie: CookieSettings) -> Self {
        Self { codec, cookie }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn cookie_settings(&self) -> &CookieSettings {
        &self.cookie
    }

    /// The session token carried by the request, if any.
    pub fn session_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|raw| find_cookie(raw, &self.cookie.name))
    }

    /// Whether the request carries a valid session.
    pub fn authenticate(&self, headers: &HeaderMap) -> bool {
        let Some(token) = self.session_token(headers).filter(|t| !t.is_empty()) else {
            metrics::record_auth_check("missing");
            return false;
        };

        if !self.codec.is_configured() {
            tracing::error!("Session secret is not configured; rejecting every session");
            metrics::record_auth_check("misconfigured");
            return false;
        }

        let valid = self.codec.verify(token);
        if !valid {
            tracing::debug!("Session cookie failed verification");
        }
        metrics::record_auth_check(if valid { "valid" } else { "invalid" });
        valid
    }

    /// A `Set-Cookie` value establishing a new session.
    pub fn create_session(&self) -> Result<HeaderValue, AuthError> {
        let token = self.codec.issue()?;
        Ok(HeaderValue::from_str(&self.cookie.render(&token))?)
    }

    /// A `Set-Cookie` value clearing the session.
    pub fn destroy_session(&self) -> Result<HeaderValue, AuthError> {
        Ok(HeaderValue::from_str(&self.cookie.render_expired())?)
    }

    /// Attach a fresh session cookie to `headers`.
    pub fn set_session_cookie(&self, headers: &mut HeaderMap) -> Result<(), AuthError> {
        headers.append(SET_COOKIE, self.create_session()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::secret::SharedSecret;
    use crate::clock::ManualClock;

    fn manager(secret: &Arc<SharedSecret>) -> SessionManager {
        let codec = TokenCodec::new(secret.clone())
            .with_clock(Arc::new(ManualClock::new(1_700_000_000_000)));
        SessionManager::new(codec, CookieSettings::default())
    }

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    fn token_from_set_cookie(value: &HeaderValue) -> String {
        let raw = value.to_str().unwrap();
        let first = raw.split(';').next().unwrap();
        first.strip_prefix("session=").unwrap().to_string()
    }

    #[test]
    fn test_create_then_authenticate() {
        let secret = Arc::new(SharedSecret::new("s3cr3t"));
        let sessions = manager(&secret);

        let set_cookie = sessions.create_session().unwrap();
        let raw = set_cookie.to_str().unwrap();
        assert!(raw.contains("HttpOnly"));
        assert!(raw.contains("SameSite=Strict"));
        assert!(raw.contains("Max-Age=604800"));
        assert!(raw.contains("Path=/"));

        let token = token_from_set_cookie(&set_cookie);
        let headers = headers_with_cookie(&format!("lang=en; session={token}"));
        assert!(sessions.authenticate(&headers));
    }

    #[test]
    fn test_missing_cookie_rejected() {
        let secret = Arc::new(SharedSecret::new("s3cr3t"));
        let sessions = manager(&secret);
        assert!(!sessions.authenticate(&HeaderMap::new()));
        assert!(!sessions.authenticate(&headers_with_cookie("session=")));
    }

    #[test]
    fn test_cookie_in_second_header_found() {
        let secret = Arc::new(SharedSecret::new("s3cr3t"));
        let sessions = manager(&secret);
        let token = token_from_set_cookie(&sessions.create_session().unwrap());

        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("lang=en"));
        headers.append(COOKIE, HeaderValue::from_str(&format!("session={token}")).unwrap());
        assert!(sessions.authenticate(&headers));
    }

    #[test]
    fn test_unset_secret_fails_closed() {
        let secret = Arc::new(SharedSecret::new("s3cr3t"));
        let sessions = manager(&secret);
        let token = token_from_set_cookie(&sessions.create_session().unwrap());

        secret.clear();
        let headers = headers_with_cookie(&format!("session={token}"));
        assert!(!sessions.authenticate(&headers));
        assert!(matches!(
            sessions.create_session(),
            Err(AuthError::MissingSecret)
        ));
    }

    #[test]
    fn test_destroy_session_clears_cookie() {
        let secret = Arc::new(SharedSecret::unset());
        let sessions = manager(&secret);
        let cleared = sessions.destroy_session().unwrap();
        let raw = cleared.to_str().unwrap();
        assert!(raw.starts_with("session=;"));
        assert!(raw.contains("Max-Age=0"));
    }
}

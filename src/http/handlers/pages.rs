//! Minimal HTML pages and the fallback handler.

use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::{Html, IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::extract::{AuthRejection, Authenticated};
use crate::http::state::AppState;

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in</title></head>
<body>
<form id="login">
  <label>Password <input type="password" name="password" autofocus required></label>
  <button type="submit">Sign in</button>
  <p id="error" role="alert"></p>
</form>
<script>
document.getElementById("login").addEventListener("submit", async (event) => {
  event.preventDefault();
  const password = new FormData(event.target).get("password");
  const res = await fetch("/api/auth/login", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({ password }),
  });
  if (res.ok) {
    window.location.href = "/";
  } else {
    const body = await res.json().catch(() => ({}));
    document.getElementById("error").textContent = body.error || "Sign in failed";
  }
});
</script>
</body>
</html>
"#;

const HOME_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Signed in</title></head>
<body>
<p>You are signed in.</p>
<form method="post" action="/api/auth/logout"><button type="submit">Sign out</button></form>
</body>
</html>
"#;

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

pub async fn home(_: Authenticated) -> Html<&'static str> {
    Html(HOME_PAGE)
}

/// Unknown paths: static-looking ones are plain 404s, everything else has to
/// pass the session check before learning that nothing is there.
pub async fn fallback(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let current = state.current();
    let gate = &current.gatekeeper;
    let path = uri.path();

    if gate.is_static_asset(path) || gate.is_public(path) {
        return ApiError::NotFound.into_response();
    }

    if !current.sessions.authenticate(&headers) {
        let rejection = if gate.is_api(path) {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::Redirect(gate.login_location(uri.query()))
        };
        return rejection.into_response();
    }

    ApiError::NotFound.into_response()
}

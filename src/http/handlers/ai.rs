//! AI endpoints: authenticate, take quota, validate, forward.
//!
//! Bodies are validated after the quota is taken, so malformed requests
//! still count against the caller.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Response,
};
use serde_json::{json, Map, Value};

use crate::http::error::ApiError;
use crate::http::extract::{Authenticated, Quota};
use crate::http::state::AppState;

const INVALID_JSON: &str = "Invalid JSON body.";
const PROMPT_REQUIRED: &str = "A non-empty 'prompt' field is required.";

/// Parse the body and pull out a trimmed, non-empty `prompt`.
pub fn parse_prompt(body: &[u8]) -> Result<(String, Map<String, Value>), ApiError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| ApiError::BadRequest(INVALID_JSON))?;
    let Value::Object(fields) = value else {
        return Err(ApiError::BadRequest(PROMPT_REQUIRED));
    };

    let prompt = fields
        .get("prompt")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or(ApiError::BadRequest(PROMPT_REQUIRED))?
        .to_string();

    Ok((prompt, fields))
}

/// `POST /api/ai/chat`: `{"prompt", "systemPrompt"?}`.
pub async fn chat(
    State(state): State<AppState>,
    _: Authenticated,
    quota: Quota,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let (prompt, fields) = parse_prompt(&body)?;

    let mut payload = json!({ "prompt": prompt });
    if let Some(system) = fields.get("systemPrompt").and_then(Value::as_str) {
        payload["systemPrompt"] = Value::String(system.to_string());
    }

    relay(&state, &quota, &headers, "chat", "/chat", &payload).await
}

/// `POST /api/ai/feedback`: `{"prompt"}`.
pub async fn feedback(
    State(state): State<AppState>,
    _: Authenticated,
    quota: Quota,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let (prompt, _) = parse_prompt(&body)?;
    relay(&state, &quota, &headers, "feedback", "/feedback", &json!({ "prompt": prompt })).await
}

async fn relay(
    state: &AppState,
    quota: &Quota,
    headers: &HeaderMap,
    route: &str,
    path: &str,
    payload: &Value,
) -> Result<Response, ApiError> {
    let current = state.current();
    let upstream = current.upstream.as_ref().ok_or(ApiError::UpstreamUnavailable)?;

    let request_id = headers.get("x-request-id").and_then(|v| v.to_str().ok());
    let mut response = upstream
        .forward(&state.client, route, path, payload, request_id)
        .await?;
    quota.apply(&mut response);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<(String, Map<String, Value>), ApiError>) -> &'static str {
        match result {
            Err(ApiError::BadRequest(message)) => message,
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn test_prompt_trimmed() {
        let (prompt, _) = parse_prompt(br#"{"prompt":"  hello  "}"#).unwrap();
        assert_eq!(prompt, "hello");
    }

    #[test]
    fn test_invalid_json() {
        assert_eq!(message(parse_prompt(b"{not json")), INVALID_JSON);
    }

    #[test]
    fn test_prompt_required() {
        assert_eq!(message(parse_prompt(br#"{"prompt":"   "}"#)), PROMPT_REQUIRED);
        assert_eq!(message(parse_prompt(br#"{"prompt":42}"#)), PROMPT_REQUIRED);
        assert_eq!(message(parse_prompt(br#"{}"#)), PROMPT_REQUIRED);
        assert_eq!(message(parse_prompt(br#"["prompt"]"#)), PROMPT_REQUIRED);
    }
}

//! Security response headers.

use axum::http::{header, HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

/// Headers added to every response when `security.enable_headers` is on.
pub fn security_headers() -> Vec<(HeaderName, HeaderValue)> {
    vec![
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ),
    ]
}

/// One layer per header. Values already set by a handler are kept.
pub fn security_header_layers() -> Vec<SetResponseHeaderLayer<HeaderValue>> {
    security_headers()
        .into_iter()
        .map(|(name, value)| SetResponseHeaderLayer::if_not_present(name, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_set() {
        let names: Vec<_> = security_headers().into_iter().map(|(n, _)| n).collect();
        assert!(names.contains(&header::X_CONTENT_TYPE_OPTIONS));
        assert!(names.contains(&header::X_FRAME_OPTIONS));
        assert_eq!(security_header_layers().len(), 3);
    }
}

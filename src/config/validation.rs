//! Configuration validation.
//!
//! Semantic checks only; serde handles the syntax. All problems are
//! collected, not just the first one.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{SiteConfig, PLACEHOLDER_ADMIN_KEY};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Upper bound for configured durations: ten years.
pub const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Validate a parsed configuration.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    check_auth(config, &mut errors);
    check_edge(config, &mut errors);
    check_rate_limit(config, &mut errors);

    if let Some(upstream) = &config.ai.upstream_url {
        match url::Url::parse(upstream) {
            Ok(url) if url.scheme() == "http" => {}
            Ok(url) => errors.push(ValidationError::new(
                "ai.upstream_url",
                format!("unsupported scheme '{}', only http is forwarded", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("ai.upstream_url", e.to_string())),
        }
    }
    if config.ai.timeout_secs == 0 {
        errors.push(ValidationError::new("ai.timeout_secs", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.admin.enabled {
        if config.admin.api_key.is_empty() || config.admin.api_key == PLACEHOLDER_ADMIN_KEY {
            errors.push(ValidationError::new(
                "admin.api_key",
                "must be set when the admin API is enabled",
            ));
        }
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "admin.bind_address",
                format!("'{}' is not a socket address", config.admin.bind_address),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_auth(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    let auth = &config.auth;
    if auth.secret_env.is_empty() {
        errors.push(ValidationError::new("auth.secret_env", "must not be empty"));
    }
    if auth.password_env.is_empty() {
        errors.push(ValidationError::new("auth.password_env", "must not be empty"));
    }
    if !is_cookie_token(&auth.cookie_name) {
        errors.push(ValidationError::new(
            "auth.cookie_name",
            format!("'{}' is not a valid cookie name", auth.cookie_name),
        ));
    }
    check_duration("auth.max_age_secs", auth.max_age_secs, errors);
}

fn check_edge(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    let edge = &config.edge;
    for path in &edge.public_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "edge.public_paths",
                format!("'{path}' must start with '/'"),
            ));
        }
    }
    for prefix in &edge.static_prefixes {
        if !prefix.starts_with('/') || prefix == "/" {
            errors.push(ValidationError::new(
                "edge.static_prefixes",
                format!("'{prefix}' must start with '/' and not be the root"),
            ));
        }
    }
    if !edge.api_prefix.starts_with('/') {
        errors.push(ValidationError::new("edge.api_prefix", "must start with '/'"));
    }
    if !edge.login_path.starts_with('/') {
        errors.push(ValidationError::new("edge.login_path", "must start with '/'"));
    } else if !edge.public_paths.iter().any(|p| p == &edge.login_path) {
        errors.push(ValidationError::new(
            "edge.login_path",
            format!(
                "'{}' must be listed in edge.public_paths or every redirect loops",
                edge.login_path
            ),
        ));
    }
}

fn check_rate_limit(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    let rl = &config.rate_limit;
    if rl.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
    }
    check_duration("rate_limit.window_secs", rl.window_secs, errors);
    check_duration("rate_limit.sweep_interval_secs", rl.sweep_interval_secs, errors);
}

fn check_duration(field: &'static str, secs: u64, errors: &mut Vec<ValidationError>) {
    if secs == 0 {
        errors.push(ValidationError::new(field, "must be greater than 0"));
    } else if secs > MAX_DURATION_SECS {
        errors.push(ValidationError::new(
            field,
            format!("must be at most {MAX_DURATION_SECS} seconds"),
        ));
    }
}

// RFC 6265 cookie-name token characters.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&SiteConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = SiteConfig::default();
        config.rate_limit.max_requests = 0;
        config.rate_limit.window_secs = 0;
        config.auth.cookie_name = "bad name".to_string();
        config.listener.bind_address = "nope".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"rate_limit.max_requests"));
        assert!(fields.contains(&"rate_limit.window_secs"));
        assert!(fields.contains(&"auth.cookie_name"));
        assert!(fields.contains(&"listener.bind_address"));
    }

    #[test]
    fn test_login_path_must_be_public() {
        let mut config = SiteConfig::default();
        config.edge.login_path = "/signin".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "edge.login_path");
    }

    #[test]
    fn test_upstream_url_checked() {
        let mut config = SiteConfig::default();
        config.ai.upstream_url = Some("ftp://models.local".to_string());
        assert!(validate_config(&config).is_err());

        config.ai.upstream_url = Some("https://models.local".to_string());
        assert!(validate_config(&config).is_err());

        config.ai.upstream_url = Some("http://127.0.0.1:9000".to_string());
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_durations_capped() {
        let mut config = SiteConfig::default();
        config.rate_limit.window_secs = u64::MAX;
        config.rate_limit.sweep_interval_secs = MAX_DURATION_SECS + 1;
        config.auth.max_age_secs = 18_446_744_073_709_552;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            [
                "auth.max_age_secs",
                "rate_limit.window_secs",
                "rate_limit.sweep_interval_secs"
            ]
        );

        config.rate_limit.window_secs = MAX_DURATION_SECS;
        config.rate_limit.sweep_interval_secs = 600;
        config.auth.max_age_secs = MAX_DURATION_SECS;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_admin_placeholder_key_rejected() {
        let mut config = SiteConfig::default();
        config.admin.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "admin.api_key");

        config.admin.api_key = "a-real-key".to_string();
        assert_eq!(validate_config(&config), Ok(()));
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Deployment environment. Production turns on `Secure` cookies.
    pub environment: Environment,

    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Session cookie and secret settings.
    pub auth: AuthConfig,

    /// Edge gatekeeper path classification.
    pub edge: EdgeConfig,

    /// Per-client quota for the AI endpoints.
    pub rate_limit: RateLimitConfig,

    /// AI upstream the protected endpoints forward to.
    pub ai: AiConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Session authentication settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Environment variable holding the HMAC secret.
    pub secret_env: String,

    /// Environment variable holding the shared site password.
    pub password_env: String,

    /// Session cookie name.
    pub cookie_name: String,

    /// Cookie max-age, also the maximum token age.
    pub max_age_secs: u64,

    /// Refuse to start when the secret is missing.
    pub require_secret_at_startup: bool,
}

impl AuthConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_env: crate::auth::secret::DEFAULT_SECRET_ENV.to_string(),
            password_env: "SITE_PASSWORD".to_string(),
            cookie_name: crate::auth::SESSION_COOKIE.to_string(),
            max_age_secs: crate::auth::SESSION_MAX_AGE_SECS,
            require_secret_at_startup: true,
        }
    }
}

/// Edge gatekeeper settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Run the gatekeeper in front of the router.
    pub enabled: bool,

    /// Paths reachable without a session (exact match or as a `/`-prefix).
    pub public_paths: Vec<String>,

    /// Prefixes served as static assets.
    pub static_prefixes: Vec<String>,

    /// Prefix of API routes. These get a 401 instead of a redirect.
    pub api_prefix: String,

    /// Where unauthenticated browser navigations are sent.
    pub login_path: String,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            public_paths: vec!["/login".to_string(), "/api/auth/login".to_string()],
            static_prefixes: vec!["/_next".to_string(), "/favicon".to_string()],
            api_prefix: "/api/".to_string(),
            login_path: "/login".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests allowed per client per window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// How often expired entries are swept, in seconds.
    pub sweep_interval_secs: u64,

    /// Key clients by `X-Forwarded-For` / `X-Real-IP` when present.
    pub trust_forwarded_headers: bool,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 30,
            window_secs: 60 * 60,
            sweep_interval_secs: 10 * 60,
            trust_forwarded_headers: true,
        }
    }
}

/// AI upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of the AI service (e.g., "http://127.0.0.1:9000").
    pub upstream_url: Option<String>,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            upstream_url: None,
            timeout_secs: 120,
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 150,
            shutdown_grace_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Placeholder admin key. Validation refuses it while the admin API is enabled.
pub const PLACEHOLDER_ADMIN_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_ADMIN_KEY.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 64 * 1024,
        }
    }
}

//! Application state shared by handlers and middleware.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::body::Body;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::auth::{CookieSettings, SecretSource, SessionManager, TokenCodec, TokenPolicy};
use crate::clock::Clock;
use crate::config::SiteConfig;
use crate::http::upstream::Upstream;
use crate::security::{Gatekeeper, RateLimitSettings, RateLimiter};

/// Everything derived from one configuration revision.
pub struct InnerState {
    pub config: SiteConfig,
    pub sessions: SessionManager,
    pub gatekeeper: Gatekeeper,
    pub upstream: Option<Upstream>,
}

impl InnerState {
    fn build(config: SiteConfig, secret: &Arc<dyn SecretSource>, clock: &Arc<dyn Clock>) -> Self {
        let policy = TokenPolicy::with_max_age(config.auth.max_age());

        let codec = TokenCodec::new(secret.clone())
            .with_clock(clock.clone())
            .with_policy(policy);
        let cookie = CookieSettings {
            name: config.auth.cookie_name.clone(),
            max_age: config.auth.max_age(),
            secure: config.environment.is_production(),
            path: "/".to_string(),
        };
        let sessions = SessionManager::new(codec, cookie);

        // Same secret source, same clock, same policy as the session manager.
        let gatekeeper = Gatekeeper::from_config(&config, secret.clone()).with_clock(clock.clone());

        let upstream = config
            .ai
            .upstream_url
            .as_deref()
            .map(|url| Upstream::new(url, config.ai.timeout()));

        Self {
            config,
            sessions,
            gatekeeper,
            upstream,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<InnerState>>,
    pub limiter: RateLimiter,
    pub client: Client<HttpConnector, Body>,
    pub password: Arc<dyn SecretSource>,
    secret: Arc<dyn SecretSource>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        config: SiteConfig,
        secret: Arc<dyn SecretSource>,
        password: Arc<dyn SecretSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let limiter =
            RateLimiter::with_clock(RateLimitSettings::from(&config.rate_limit), clock.clone());
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let inner = InnerState::build(config, &secret, &clock);

        Self {
            inner: Arc::new(ArcSwap::from_pointee(inner)),
            limiter,
            client,
            password,
            secret,
            clock,
        }
    }

    /// The configuration revision in force.
    pub fn current(&self) -> Arc<InnerState> {
        self.inner.load_full()
    }

    pub fn secret(&self) -> &Arc<dyn SecretSource> {
        &self.secret
    }

    /// Swap in a new configuration. Rate-limit state survives the swap.
    pub fn apply_config(&self, config: SiteConfig) {
        let previous = self.current();
        if RateLimitSettings::from(&config.rate_limit) != self.limiter.settings() {
            tracing::warn!("Rate limit settings changed; they take effect after a restart");
        }
        if config.auth.secret_env != previous.config.auth.secret_env {
            tracing::warn!("auth.secret_env changed; it takes effect after a restart");
        }

        let next = InnerState::build(config, &self.secret, &self.clock);
        self.inner.store(Arc::new(next));
        tracing::info!("Configuration reloaded");
    }
}

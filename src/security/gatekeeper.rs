//! Edge gatekeeper: the fast, non-authoritative session check.
//!
//! Works only from the raw request path and the raw `Cookie` header, so it
//! can sit in front of everything else in the stack. Token verification is
//! delegated to [`token::verify_with`], the same function the
//! [`SessionManager`](crate::auth::SessionManager) uses.
//!
//! Passing this check grants nothing. Handlers still run the authoritative
//! check; this layer only rejects obviously unauthenticated traffic early.

use std::sync::Arc;

use crate::auth::cookie::find_cookie;
use crate::auth::secret::SecretSource;
use crate::auth::token::{self, TokenPolicy};
use crate::clock::{Clock, SystemClock};
use crate::config::{EdgeConfig, SiteConfig};

/// How a request path is treated before any session check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    StaticAsset,
    Public,
    Api,
    Page,
}

/// Why a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    StaticAsset,
    PublicPath,
    Authenticated,
}

/// Outcome of the edge check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    /// Continue to the application unmodified.
    Pass(PassReason),
    /// Answer 401 with a JSON error body.
    Unauthorized,
    /// Send the browser to the login page.
    Redirect { location: String },
}

impl EdgeDecision {
    pub fn outcome(&self) -> &'static str {
        match self {
            EdgeDecision::Pass(PassReason::StaticAsset) => "static",
            EdgeDecision::Pass(PassReason::PublicPath) => "public",
            EdgeDecision::Pass(PassReason::Authenticated) => "authenticated",
            EdgeDecision::Unauthorized => "unauthorized",
            EdgeDecision::Redirect { .. } => "redirect",
        }
    }
}

#[derive(Clone)]
pub struct Gatekeeper {
    edge: EdgeConfig,
    cookie_name: String,
    secret: Arc<dyn SecretSource>,
    clock: Arc<dyn Clock>,
    policy: TokenPolicy,
}

impl Gatekeeper {
    pub fn new(
        edge: EdgeConfig,
        cookie_name: impl Into<String>,
        secret: Arc<dyn SecretSource>,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            edge,
            cookie_name: cookie_name.into(),
            secret,
            clock: Arc::new(SystemClock),
            policy,
        }
    }

    pub fn from_config(config: &SiteConfig, secret: Arc<dyn SecretSource>) -> Self {
        Self::new(
            config.edge.clone(),
            config.auth.cookie_name.clone(),
            secret,
            TokenPolicy::with_max_age(config.auth.max_age()),
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.edge
    }

    /// Classify a request path.
    ///
    /// Anything containing a dot is treated as a static file, as are the
    /// configured static prefixes.
    pub fn classify(&self, path: &str) -> PathClass {
        if self.is_static_asset(path) {
            PathClass::StaticAsset
        } else if self.is_public(path) {
            PathClass::Public
        } else if self.is_api(path) {
            PathClass::Api
        } else {
            PathClass::Page
        }
    }

    pub fn is_static_asset(&self, path: &str) -> bool {
        path.contains('.')
            || self
                .edge
                .static_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.edge.public_paths.iter().any(|public| {
            path == public
                || path
                    .strip_prefix(public.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn is_api(&self, path: &str) -> bool {
        path.starts_with(self.edge.api_prefix.as_str())
    }

    /// Whether the raw `Cookie` header carries a valid session token.
    pub fn has_valid_session(&self, cookie_header: Option<&str>) -> bool {
        let Some(token) = cookie_header.and_then(|raw| find_cookie(raw, &self.cookie_name)) else {
            return false;
        };
        let Some(secret) = self.secret.current() else {
            return false;
        };
        token::verify_with(&secret, token, self.clock.now_millis(), &self.policy)
    }

    /// Decide what to do with a request.
    pub fn decide(
        &self,
        path: &str,
        query: Option<&str>,
        cookie_header: Option<&str>,
    ) -> EdgeDecision {
        match self.classify(path) {
            PathClass::StaticAsset => EdgeDecision::Pass(PassReason::StaticAsset),
            PathClass::Public => EdgeDecision::Pass(PassReason::PublicPath),
            class => {
                if self.has_valid_session(cookie_header) {
                    EdgeDecision::Pass(PassReason::Authenticated)
                } else if class == PathClass::Api {
                    EdgeDecision::Unauthorized
                } else {
                    EdgeDecision::Redirect {
                        location: self.login_location(query),
                    }
                }
            }
        }
    }

    /// Login URL, carrying over the original query string.
    pub fn login_location(&self, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}?{q}", self.edge.login_path),
            None => self.edge.login_path.clone(),
        }
    }
}

impl std::fmt::Debug for Gatekeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gatekeeper")
            .field("edge", &self.edge)
            .field("cookie_name", &self.cookie_name)
            .finish()
    }
}

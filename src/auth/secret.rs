//! Where the signing secret comes from.
//!
//! The secret is looked up on every sign/verify call so a rotation takes
//! effect immediately. An empty value counts as unset.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

/// Default environment variable holding the HMAC secret.
pub const DEFAULT_SECRET_ENV: &str = "AUTH_SECRET";

/// Provider of the current HMAC secret.
pub trait SecretSource: Send + Sync {
    /// The secret in force right now, or `None` when it is not configured.
    fn current(&self) -> Option<String>;
}

/// Reads the secret from an environment variable on each call.
#[derive(Debug, Clone)]
pub struct EnvSecret {
    var: String,
}

impl EnvSecret {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvSecret {
    fn default() -> Self {
        Self::new(DEFAULT_SECRET_ENV)
    }
}

impl SecretSource for EnvSecret {
    fn current(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|s| !s.is_empty())
    }
}

/// An in-process secret that can be rotated or cleared at runtime.
#[derive(Debug, Default)]
pub struct SharedSecret {
    value: ArcSwapOption<String>,
}

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        let shared = Self::default();
        shared.rotate(secret);
        shared
    }

    /// A source with no secret configured.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn rotate(&self, secret: impl Into<String>) {
        let secret = secret.into();
        if secret.is_empty() {
            self.clear();
        } else {
            self.value.store(Some(Arc::new(secret)));
        }
    }

    pub fn clear(&self) {
        self.value.store(None);
    }
}

impl SecretSource for SharedSecret {
    fn current(&self) -> Option<String> {
        self.value.load_full().map(|s| s.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_secret_rotation() {
        let secret = SharedSecret::new("s3cr3t");
        assert_eq!(secret.current().as_deref(), Some("s3cr3t"));

        secret.rotate("other");
        assert_eq!(secret.current().as_deref(), Some("other"));

        secret.rotate("");
        assert_eq!(secret.current(), None);
    }

    #[test]
    fn test_unset_secret() {
        assert_eq!(SharedSecret::unset().current(), None);
    }

    #[test]
    fn test_env_secret_missing_variable() {
        let source = EnvSecret::new("SITE_GATE_TEST_SECRET_THAT_IS_NEVER_SET");
        assert_eq!(source.current(), None);
    }
}

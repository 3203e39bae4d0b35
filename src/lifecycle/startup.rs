//! Startup checks.
//!
//! A missing secret would make every session check fail one request at a
//! time. It is caught here instead, before the listener binds.

use thiserror::Error;

use crate::auth::secret::SecretSource;
use crate::config::SiteConfig;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("session secret is not configured: set the {0} environment variable")]
    MissingSecret(String),
}

/// Verify the deployment can issue and check sessions.
pub fn preflight(config: &SiteConfig, secret: &dyn SecretSource) -> Result<(), StartupError> {
    if secret.current().is_some() {
        tracing::info!(variable = %config.auth.secret_env, "Session secret present");
        return Ok(());
    }

    if config.auth.require_secret_at_startup {
        tracing::error!(
            variable = %config.auth.secret_env,
            "Session secret missing; refusing to start"
        );
        return Err(StartupError::MissingSecret(config.auth.secret_env.clone()));
    }

    tracing::error!(
        variable = %config.auth.secret_env,
        "Session secret missing; every session check will fail until it is set"
    );
    Ok(())
}

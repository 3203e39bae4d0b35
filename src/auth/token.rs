//! Session token signing and verification.
//!
//! Token format: `authenticated:<issued_at_millis>.<hex(hmac_sha256(secret, payload))>`
//!
//! [`sign_with`] and [`verify_with`] are pure functions of their inputs and are
//! the only verification logic in the crate. Both the authoritative
//! [`SessionManager`](crate::auth::SessionManager) and the edge
//! [`Gatekeeper`](crate::security::gatekeeper::Gatekeeper) call into them, so
//! the two checks cannot drift apart.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::error::AuthError;
use crate::auth::secret::SecretSource;
use crate::clock::{duration_millis, Clock, SystemClock};

type HmacSha256 = Hmac<Sha256>;

/// Tag every payload starts with.
pub const TOKEN_TAG: &str = "authenticated:";

/// Length of a hex-encoded HMAC-SHA256 signature.
pub const SIGNATURE_HEX_LEN: usize = 64;

/// Age limits applied to the issue time embedded in a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    /// Tokens older than this are rejected even if the cookie survived.
    pub max_age: Duration,
    /// Tolerated clock skew for tokens stamped slightly in the future.
    pub max_future_skew: Duration,
}

impl TokenPolicy {
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            max_age,
            ..Self::default()
        }
    }

    fn accepts(&self, issued_at_ms: u64, now_ms: u64) -> bool {
        let skew = duration_millis(self.max_future_skew);
        let max_age = duration_millis(self.max_age);

        if issued_at_ms > now_ms.saturating_add(skew) {
            return false;
        }
        now_ms.saturating_sub(issued_at_ms) <= max_age
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(crate::auth::SESSION_MAX_AGE_SECS),
            max_future_skew: Duration::from_secs(60),
        }
    }
}

fn mac_bytes(secret: &str, payload: &str) -> [u8; 32] {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key length is always valid");
    mac.update(payload.as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Sign `payload` with `secret`, returning the lowercase hex signature.
pub fn sign_with(secret: &str, payload: &str) -> String {
    hex::encode(mac_bytes(secret, payload))
}

/// Build the payload for a token issued at `issued_at_ms`.
pub fn payload_at(issued_at_ms: u64) -> String {
    format!("{TOKEN_TAG}{issued_at_ms}")
}

/// Build a complete token issued at `issued_at_ms`.
pub fn issue_with(secret: &str, issued_at_ms: u64) -> String {
    let payload = payload_at(issued_at_ms);
    let signature = sign_with(secret, &payload);
    format!("{payload}.{signature}")
}

/// Verify `token` against `secret` at time `now_ms`.
///
/// Never panics and never errors: every malformed, tampered, expired or
/// foreign token yields `false`. Signatures are compared in constant time.
pub fn verify_with(secret: &str, token: &str, now_ms: u64, policy: &TokenPolicy) -> bool {
    let Some((payload, signature)) = token.rsplit_once('.') else {
        return false;
    };
    let Some(issued_at) = payload.strip_prefix(TOKEN_TAG) else {
        return false;
    };

    // Uppercase hex decodes to the same bytes; only the canonical form is accepted.
    if signature.len() != SIGNATURE_HEX_LEN || !is_lower_hex(signature) {
        return false;
    }
    let Ok(provided) = hex::decode(signature) else {
        return false;
    };

    let expected = mac_bytes(secret, payload);
    let signature_matches: bool = expected.as_slice().ct_eq(provided.as_slice()).into();
    if !signature_matches {
        return false;
    }

    match issued_at.parse::<u64>() {
        Ok(issued_at_ms) => policy.accepts(issued_at_ms, now_ms),
        Err(_) => false,
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Signs and verifies session tokens with the secret currently in force.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Arc<dyn SecretSource>,
    clock: Arc<dyn Clock>,
    policy: TokenPolicy,
}

impl TokenCodec {
    pub fn new(secret: Arc<dyn SecretSource>) -> Self {
        Self {
            secret,
            clock: Arc::new(SystemClock),
            policy: TokenPolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: TokenPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn secret_source(&self) -> &Arc<dyn SecretSource> {
        &self.secret
    }

    /// Whether a secret is configured right now.
    pub fn is_configured(&self) -> bool {
        self.secret.current().is_some()
    }

    /// HMAC-SHA256 of `payload` as lowercase hex.
    ///
    /// Fails with [`AuthError::MissingSecret`] when no secret is configured.
    pub fn sign(&self, payload: &str) -> Result<String, AuthError> {
        let secret = self.secret.current().ok_or(AuthError::MissingSecret)?;
        Ok(sign_with(&secret, payload))
    }

    /// Mint a fresh token stamped with the current time.
    pub fn issue(&self) -> Result<String, AuthError> {
        let secret = self.secret.current().ok_or(AuthError::MissingSecret)?;
        Ok(issue_with(&secret, self.clock.now_millis()))
    }

    /// Check a token. Returns `false` when no secret is configured.
    pub fn verify(&self, token: &str) -> bool {
        match self.secret.current() {
            Some(secret) => verify_with(&secret, token, self.clock.now_millis(), &self.policy),
            None => false,
        }
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("configured", &self.is_configured())
            .field("policy", &self.policy)
            .finish()
    }
}

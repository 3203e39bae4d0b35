//! Session authentication.
//!
//! # Data Flow
//! ```text
//! POST /api/auth/login
//!     → session.rs (create_session)
//!     → token.rs (issue: "authenticated:<ms>" + HMAC-SHA256)
//!     → cookie.rs (Set-Cookie: session=...; HttpOnly; SameSite=Strict)
//!
//! Protected request:
//!     → session.rs (authenticate: read cookie)
//!     → token.rs (verify_with: constant-time signature check + age check)
//! ```
//!
//! The secret is resolved through [`SecretSource`] on every call. With no
//! secret configured nothing verifies and nothing can be issued.

pub mod cookie;
pub mod error;
pub mod secret;
pub mod session;
pub mod token;

pub use cookie::CookieSettings;
pub use error::AuthError;
pub use secret::{EnvSecret, SecretSource, SharedSecret};
pub use session::SessionManager;
pub use token::{TokenCodec, TokenPolicy};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Session lifetime: seven days.
pub const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

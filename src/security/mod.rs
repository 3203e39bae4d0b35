//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (security response headers)
//!     → gatekeeper.rs (edge session check: pass / 401 / redirect)
//!     → router
//!         → auth::SessionManager (authoritative check, every protected handler)
//!         → rate_limit.rs (per-client quota on AI endpoints)
//! ```
//!
//! The gatekeeper and the session manager verify tokens with the same
//! function. Both always run; the gatekeeper alone is never trusted.

pub mod gatekeeper;
pub mod headers;
pub mod rate_limit;

pub use gatekeeper::{EdgeDecision, Gatekeeper, PassReason, PathClass};
pub use rate_limit::{RateLimitDecision, RateLimitSettings, RateLimiter};

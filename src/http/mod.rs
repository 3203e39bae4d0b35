//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/gatekeeper.rs (edge check: pass / 401 / 307 to login)
//!     → handlers/ (routes)
//!         → extract.rs (Authenticated: authoritative check; Quota: rate limit)
//!         → upstream.rs (AI requests forwarded to the model service)
//!     → error.rs (JSON error bodies)
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod state;
pub mod tls;
pub mod upstream;

pub use error::ApiError;
pub use extract::{client_key, Authenticated, Quota};
pub use server::HttpServer;
pub use state::AppState;

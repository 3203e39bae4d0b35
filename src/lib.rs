//! Password gate for a small web application.
//!
//! Signed session cookies, an edge check in front of every route, an
//! authoritative check inside every protected handler, and a per-client
//! fixed-window quota on the AI endpoints.

pub mod admin;
pub mod auth;
pub mod clock;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::SiteConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SiteConfig (validated, immutable)
//!     → shared via ArcSwap with the HTTP server
//!
//! On file change:
//!     watcher.rs sees events in the config's directory, debounces them
//!     → skips empty or unchanged contents
//!     → loader.rs parses the new config
//!     → validation.rs validates
//!     → sent to the server, which swaps it in atomically
//! ```
//!
//! Secrets never live in the file: the config only names the environment
//! variables they are read from.

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, AiConfig, AuthConfig, EdgeConfig, Environment, ListenerConfig, LogFormat,
    ObservabilityConfig, RateLimitConfig, SecurityConfig, SiteConfig, TimeoutConfig, TlsConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;

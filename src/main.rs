//! site-gate
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──▶ request id ─▶ trace ─▶ timeout ─▶ body limit ─▶ security headers
//!         ─▶ edge gatekeeper ──(401 JSON / 307 /login)──▶ Client
//!              │ pass
//!              ▼
//!         router ─▶ Authenticated (authoritative) ─▶ Quota (rate limit)
//!              │
//!              ▼
//!         handler ─▶ AI upstream (chat / feedback)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use site_gate::auth::EnvSecret;
use site_gate::config::{load_config, ConfigWatcher, SiteConfig};
use site_gate::http::tls::load_tls_config;
use site_gate::lifecycle::{preflight, signals::shutdown_signal, Shutdown};
use site_gate::observability::{logging, metrics};
use site_gate::HttpServer;

#[derive(Parser, Debug)]
#[command(
    name = "site-gate",
    version,
    about = "Password-gated site with rate-limited AI endpoints"
)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "SITE_GATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SiteConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "site-gate starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = config.environment.as_str(),
        edge_enabled = config.edge.enabled,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window_secs,
        "Configuration loaded"
    );

    preflight(&config, &EnvSecret::new(config.auth.secret_env.clone()))?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the life of the process.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (rx, Some(handle)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload disabled");
                    (rx, None)
                }
            }
        }
        None => (tokio::sync::mpsc::unbounded_channel().1, None),
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    let tls = config.listener.tls.clone();
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config);
    match tls {
        Some(tls) => {
            let rustls = load_tls_config(&tls).await?;
            let listener = listener.into_std()?;
            server
                .run_tls(listener, rustls, config_updates, server_shutdown)
                .await?;
        }
        None => server.run(listener, config_updates, server_shutdown).await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every route and the edge gatekeeper
//! - Wire up middleware (request ID, tracing, timeout, body limit, headers)
//! - Swap in reloaded configuration
//! - Serve plain HTTP or TLS until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::auth::{EnvSecret, SecretSource};
use crate::clock::{Clock, SystemClock};
use crate::config::SiteConfig;
use crate::http::handlers::{ai, auth, pages};
use crate::http::middleware::edge_gatekeeper;
use crate::http::state::AppState;
use crate::security::headers::security_header_layers;

/// HTTP server for the gated site.
pub struct HttpServer {
    router: Router,
    config: SiteConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server reading the secret and site password from the
    /// environment variables named in `config.auth`.
    pub fn new(config: SiteConfig) -> Self {
        let secret = Arc::new(EnvSecret::new(config.auth.secret_env.clone()));
        let password = Arc::new(EnvSecret::new(config.auth.password_env.clone()));
        Self::with_sources(config, secret, password)
    }

    pub fn with_sources(
        config: SiteConfig,
        secret: Arc<dyn SecretSource>,
        password: Arc<dyn SecretSource>,
    ) -> Self {
        Self::with_clock(config, secret, password, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: SiteConfig,
        secret: Arc<dyn SecretSource>,
        password: Arc<dyn SecretSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = AppState::new(config.clone(), secret, password, clock);
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &SiteConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(pages::home))
            .route("/login", get(pages::login_page))
            .route("/api/auth/login", post(auth::login))
            .route("/api/auth/logout", post(auth::logout))
            .route("/api/auth/session", get(auth::session_status))
            .route("/api/ai/chat", post(ai::chat))
            .route("/api/ai/feedback", post(ai::feedback))
            .fallback(pages::fallback)
            .layer(middleware::from_fn_with_state(state.clone(), edge_gatekeeper))
            .with_state(state);

        if config.security.enable_headers {
            for layer in security_header_layers() {
                router = router.layer(layer);
            }
        }

        router
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<SiteConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        self.spawn_background(config_updates, &shutdown).await?;

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS.
    pub async fn run_tls(
        self,
        listener: std::net::TcpListener,
        tls: RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<SiteConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTPS server starting");

        self.spawn_background(config_updates, &shutdown).await?;

        let handle = Handle::new();
        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTPS server draining connections");
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::from_tcp_rustls(listener, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Config reloads and the admin listener.
    async fn spawn_background(
        &self,
        mut config_updates: mpsc::UnboundedReceiver<SiteConfig>,
        shutdown: &broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let reload_state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                reload_state.apply_config(config);
            }
        });

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            tracing::info!(
                address = %admin_listener.local_addr()?,
                "Admin API listening"
            );
            let admin_app = setup_admin_router(self.state.clone());
            let mut admin_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                let result = axum::serve(admin_listener, admin_app)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin API stopped");
                }
            });
        }

        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }
}

//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{body::Bytes, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use site_gate::auth::SecretSource;
use site_gate::clock::Clock;
use site_gate::config::SiteConfig;
use site_gate::{HttpServer, Shutdown};

pub const PASSWORD: &str = "correct horse";
pub const SECRET: &str = "integration-secret";

/// Start a mock AI service that echoes what it received.
///
/// `POST /chat` and `POST /feedback` answer `{"route": .., "received": <body>}`;
/// a prompt of `"fail"` gets a 500.
#[allow(dead_code)]
pub async fn start_mock_upstream() -> SocketAddr {
    async fn echo(route: &'static str, body: Bytes) -> (StatusCode, Json<Value>) {
        let received: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        let status = if received["prompt"] == "fail" {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        (status, Json(json!({ "route": route, "received": received })))
    }

    let app = Router::new()
        .route("/chat", post(|body: Bytes| echo("chat", body)))
        .route("/feedback", post(|body: Bytes| echo("feedback", body)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A running gate on an ephemeral port.
pub struct TestGate {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<SiteConfig>,
}

#[allow(dead_code)]
impl TestGate {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

/// Defaults suitable for plain-HTTP tests.
pub fn test_config(upstream: Option<SocketAddr>) -> SiteConfig {
    let mut config = SiteConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.ai.upstream_url = upstream.map(|addr| format!("http://{addr}"));
    config
}

#[allow(dead_code)]
pub async fn spawn_gate(
    config: SiteConfig,
    secret: Arc<dyn SecretSource>,
    password: Arc<dyn SecretSource>,
) -> TestGate {
    spawn_server(HttpServer::with_sources(config, secret, password)).await
}

#[allow(dead_code)]
pub async fn spawn_gate_with_clock(
    config: SiteConfig,
    secret: Arc<dyn SecretSource>,
    password: Arc<dyn SecretSource>,
    clock: Arc<dyn Clock>,
) -> TestGate {
    spawn_server(HttpServer::with_clock(config, secret, password, clock)).await
}

pub async fn spawn_server(server: HttpServer) -> TestGate {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let (config_tx, config_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        server.run(listener, config_rx, rx).await.unwrap();
    });

    TestGate {
        addr,
        shutdown,
        config_tx,
    }
}

/// HTTP client that never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Log in and return the `name=value` cookie pair to send back.
#[allow(dead_code)]
pub async fn login(gate: &TestGate) -> String {
    let res = client()
        .post(gate.url("/api/auth/login"))
        .json(&json!({ "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    cookie_pair(&res)
}

pub fn cookie_pair(res: &reqwest::Response) -> String {
    res.headers()["set-cookie"]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

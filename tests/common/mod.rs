//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use edge_gateway::config::{GatewayConfig, RouteConfig};
use edge_gateway::http::HttpServer;
use edge_gateway::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What a mock backend has seen so far.
#[derive(Clone, Default)]
pub struct Recorded {
    hits: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl Recorded {
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    /// Raw request heads, one entry per connection.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Request line of the most recent request, e.g. `GET /x HTTP/1.1`.
    pub fn last_request_line(&self) -> Option<String> {
        self.requests()
            .last()
            .and_then(|r| r.lines().next().map(str::to_string))
    }
}

/// Start a mock backend that answers every request with `status` and `body`.
pub async fn start_mock_backend(
    status: &'static str,
    extra_headers: &'static str,
    body: &'static str,
) -> (SocketAddr, Recorded) {
    let reply = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
        status,
        body.len(),
        extra_headers,
        body
    );
    start_raw_backend(reply.into_bytes(), Duration::ZERO).await
}

/// Start a backend that writes `reply` verbatim after `delay`.
pub async fn start_raw_backend(reply: Vec<u8>, delay: Duration) -> (SocketAddr, Recorded) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Recorded::default();
    let reply = Arc::new(reply);

    let seen = recorded.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let seen = seen.clone();
            let reply = reply.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                seen.hits.fetch_add(1, Ordering::SeqCst);
                seen.requests
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&buf[..n]).into_owned());

                tokio::time::sleep(delay).await;
                let _ = socket.write_all(&reply).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, recorded)
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Gateway config with side effects (metrics exporter, sample fetch) off.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.observability.metrics_enabled = false;
    config.sample_client.enabled = false;
    config
}

/// The `/proxy` route pointed at a local backend.
pub fn proxy_route_to(backend: SocketAddr) -> RouteConfig {
    let mut route = RouteConfig::sample_proxy();
    route.uri = format!("http://{}/", backend);
    route
}

/// Run a gateway on an ephemeral port. Dropping the `Shutdown` stops it.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).expect("gateway config should be valid");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

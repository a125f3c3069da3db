//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start background tasks (metrics exporter, sample document fetch)
//! - Bind listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds before the sample fetch so the gateway is reachable first
//! - A failed sample fetch is logged, never fatal

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::client::PersonClient;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::http::HttpServer;
use crate::observability::metrics;

/// Run the gateway until `shutdown` fires.
pub async fn run(config: GatewayConfig, shutdown: broadcast::Receiver<()>) -> GatewayResult<()> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| GatewayError::Address(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let server = HttpServer::new(config.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    if config.sample_client.enabled {
        let client = PersonClient::new(
            &config.sample_client.base_url,
            Duration::from_secs(config.timeouts.upstream_secs),
        )?;
        tokio::spawn(fetch_sample(client));
    }

    server.run(listener, shutdown).await?;
    Ok(())
}

async fn fetch_sample(client: PersonClient) {
    match client.get().await {
        Ok(person) => tracing::info!(person = ?person, "Fetched sample document"),
        Err(e) => tracing::warn!(base_url = %client.base_url(), error = %e, "Sample document fetch failed"),
    }
}

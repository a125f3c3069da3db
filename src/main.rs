//! Edge gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                     GATEWAY                      │
//!                        │                                                  │
//!   Client Request       │  ┌─────────┐    ┌───────────┐    ┌───────────┐   │
//!   ─────────────────────┼─▶│  http   │───▶│  graphql  │    │  routing  │   │
//!                        │  │ server  │    │  / admin  │    │   table   │   │
//!                        │  └────┬────┘    └───────────┘    └─────┬─────┘   │
//!                        │       │ fallback                        │         │
//!                        │       ▼                                 ▼         │
//!                        │  ┌───────────────────────────────────────────┐    │
//!                        │  │ proxy dispatcher: match → rewrite →       │    │
//!                        │  │ forward → header transform                │    │
//!                        │  └─────────────────────┬─────────────────────┘    │
//!                        │                        │ upstream                 │
//!   Client Response      │                        ▼                          │
//!   ◀────────────────────┼──────────────── reqwest client ◀────────────────┼──── Upstream
//!                        │                                                  │
//!                        │  config · observability · lifecycle              │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_gateway::config::loader::load_config;
use edge_gateway::config::GatewayConfig;
use edge_gateway::lifecycle::{startup, Shutdown};
use edge_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "edge-gateway")]
#[command(about = "Reverse proxy and GraphQL gateway", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-gateway starting");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    shutdown.trigger_on_signal();

    startup::run(config, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

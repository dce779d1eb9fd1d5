//! Round-robin HTTP reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                  RR-PROXY                    │
//!                     │                                              │
//!   Client Request    │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!   ──────────────────┼─▶│  http   │───▶│ balancer │───▶│ backend │──┼──▶ Backend
//!                     │  │ server  │    │ (round   │    │ forward │  │    Server
//!   Client Response   │  │         │    │  robin)  │    │         │  │
//!   ◀─────────────────┼──│         │◀───│          │◀───│         │◀─┼───
//!                     │  └─────────┘    └──────────┘    └─────────┘  │
//!                     │                                              │
//!                     │  config · lifecycle · observability          │
//!                     └──────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use rr_proxy::cli::Cli;
use rr_proxy::config::ProxyConfig;
use rr_proxy::lifecycle::{signals, Shutdown};
use rr_proxy::observability::logging;
use rr_proxy::HttpServer;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);
    tracing::info!("rr-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        backends = config.backends.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    let server = HttpServer::new(&config)?;
    let listener = TcpListener::bind(config.listener.bind_address()).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server.run(listener, server_shutdown).await?;
    Ok(())
}

//! FaaS gateway
//!
//! Front door for function invocations and control-plane calls.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                   GATEWAY                     │
//!   /function/<name>   │  ┌────────────┐   ┌───────────┐               │
//!   ───────────────────┼─▶│ scale gate │──▶│ forwarder │───────────────┼──▶ provider /
//!                      │  └─────┬──────┘   └───────────┘               │    function
//!                      │        │ cache hit / scaler call              │
//!                      │  ┌─────▼──────┐                               │
//!                      │  │  function  │◀── invalidate ──┐             │
//!                      │  │   cache    │                 │             │
//!                      │  └────────────┘   ┌─────────────┴──┐          │
//!   /system/...        │                   │ cache coherence│          │
//!   ───────────────────┼──────────────────▶│  + forwarder   │──────────┼──▶ provider
//!                      │                   └────────────────┘          │
//!                      └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use faas_gateway::config::load_config;
use faas_gateway::lifecycle::{shutdown_signal, Shutdown};
use faas_gateway::observability::{logging, metrics};
use faas_gateway::GatewayServer;

#[derive(Parser, Debug)]
#[command(name = "faas-gateway", version, about = "Serverless function gateway")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;

    logging::init_tracing(&config.observability);

    tracing::info!("faas-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        provider_url = %config.upstream.provider_url,
        upstream_timeout_secs = config.upstream.timeout_secs,
        direct_functions = config.upstream.direct_functions,
        scaling_enabled = config.scaling.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = GatewayServer::new(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_required() {
        assert!(Cli::try_parse_from(["faas-gateway"]).is_err());

        let cli = Cli::try_parse_from(["faas-gateway", "--config", "gateway.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("gateway.toml"));
    }
}

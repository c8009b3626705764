//! signal-sidecar entry point.
//!
//! Wires the subsystems together: configuration, logging, metrics, the two
//! polling loops, the TCP agent listener, and the HTTP status API, all
//! coordinated by one shutdown broadcast.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use signal_sidecar::collector::{CensusCollector, HealthCollector};
use signal_sidecar::config::loader::load_config;
use signal_sidecar::config::validation::validate_config;
use signal_sidecar::net::AgentListener;
use signal_sidecar::observability::{logging, metrics};
use signal_sidecar::{HttpServer, Shutdown, SidecarConfig, SidecarState};

#[derive(Parser, Debug)]
#[command(name = "signal-sidecar", about = "Health and load-weight sidecar for a conferencing-signal node")]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = SidecarConfig::default();
            validate_config(&mut config).expect("default config must validate");
            config
        }
    };

    logging::init(&config.observability.log_level);
    tracing::info!(config = ?config, "signal-sidecar startup");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let config = Arc::new(config);
    let state = Arc::new(SidecarState::new());
    let shutdown = Shutdown::new();

    // Health polling loop.
    let collector = HealthCollector::new(config.clone(), state.clone());
    let collector_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        collector.run(collector_shutdown).await;
    });

    // Census polling loop, when enabled.
    if config.census.enabled {
        let census = CensusCollector::new(config.clone(), state.clone());
        let census_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            census.run(census_shutdown).await;
        });
    }

    // TCP agent-check listener.
    let agent = AgentListener::bind(config.clone(), state.clone()).await?;
    let agent_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        agent.run(agent_shutdown).await;
    });

    // HTTP status API.
    let listener = TcpListener::bind(&config.http.bind_address).await?;
    let server = HttpServer::new(config.clone(), state.clone());
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(async move {
        server.run(listener, server_shutdown).await
    });

    signal_sidecar::lifecycle::wait_for_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}

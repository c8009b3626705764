//! TCP agent-check listener.
//!
//! # Responsibilities
//! - Accept load-balancer agent-check connections
//! - Answer each with one freshly evaluated agent line
//! - Close the connection unconditionally after the write
//!
//! Each connection is a single-shot, stateless query/response: there is no
//! session to keep, so per-connection resource lifetime is bounded by one
//! write.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::collector::state::SidecarState;
use crate::config::SidecarConfig;
use crate::observability::metrics;
use crate::overlay::{self, agent};

pub struct AgentListener {
    listener: TcpListener,
    config: Arc<SidecarConfig>,
    state: Arc<SidecarState>,
}

impl AgentListener {
    /// Bind the agent-check port.
    pub async fn bind(
        config: Arc<SidecarConfig>,
        state: Arc<SidecarState>,
    ) -> Result<Self, std::io::Error> {
        let addr: SocketAddr = config
            .agent
            .bind_address
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(address = %addr, "Agent listener bound");
        Ok(Self {
            listener,
            config,
            state,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Accept and answer agent checks until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            tracing::debug!(peer = %peer, "agent check accepted");
                            let config = self.config.clone();
                            let state = self.state.clone();
                            tokio::spawn(async move {
                                answer(stream, &state, &config).await;
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "agent accept failed");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Agent listener received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// Write one agent line and close the connection.
async fn answer(mut stream: TcpStream, state: &SidecarState, config: &SidecarConfig) {
    metrics::record_agent_check();

    let line = match overlay::evaluate_latest(state, config) {
        Some(report) => report.agent_line,
        None => {
            tracing::warn!("agent check before first health cycle, answering fail-safe");
            agent::FAIL_SAFE_LINE.to_string()
        }
    };

    if let Err(e) = stream.write_all(line.as_bytes()).await {
        tracing::debug!(error = %e, "agent check write failed");
    }
    let _ = stream.shutdown().await;
}

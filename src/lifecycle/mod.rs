//! Process lifecycle: startup ordering and coordinated shutdown.

pub mod shutdown;

pub use shutdown::Shutdown;

/// Wait for Ctrl-C.
pub async fn wait_for_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}

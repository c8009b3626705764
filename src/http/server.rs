//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with all status handlers
//! - Wire up middleware (request tracing, timeouts)
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::collector::state::SidecarState;
use crate::config::SidecarConfig;
use crate::http::handlers;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SidecarConfig>,
    pub state: Arc<SidecarState>,
}

/// HTTP status API server.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over the shared sidecar state.
    pub fn new(config: Arc<SidecarConfig>, state: Arc<SidecarState>) -> Self {
        let census_enabled = config.census.enabled;
        let app_state = AppState { config, state };

        let mut router = Router::new()
            // health of the sidecar itself
            .route("/health", get(handlers::liveness))
            // overall health of the signal node, safe as a public endpoint
            .route("/about/health", get(handlers::summary_health))
            .route("/signal/health", get(handlers::summary_health))
            // detailed report for internal load-balancing use
            .route("/signal/report", get(handlers::health_report));

        if census_enabled {
            router = router.route("/signal/census", get(handlers::census_report));
        }

        let router = router
            .with_state(app_state)
            .layer(TimeoutLayer::new(Duration::from_secs(10)))
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

//! HTTP status API handlers.
//!
//! Every handler that reports node health re-evaluates the overlay against
//! the current wall clock, so two requests microseconds apart can differ only
//! insofar as time or the snapshot moved between them.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::overlay;

/// Liveness of the sidecar itself.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Summary health: `OK` / `NOT_OK`, intended as the load balancer's HTTP
/// check and safe to expose publicly.
pub async fn summary_health(State(app): State<AppState>) -> Response {
    match overlay::evaluate_latest(&app.state, &app.config) {
        Some(report) if report.healthy => {
            metrics::record_health_check(true);
            (StatusCode::OK, "OK").into_response()
        }
        Some(report) => {
            metrics::record_health_check(false);
            tracing::info!(status = %report.status.as_str(), damped = report.damped, "health check returned 503");
            (StatusCode::SERVICE_UNAVAILABLE, "NOT_OK").into_response()
        }
        None => {
            metrics::record_health_check(false);
            tracing::warn!("health check returned 500: no health cycle has completed");
            (StatusCode::INTERNAL_SERVER_ERROR, "NOT_OK").into_response()
        }
    }
}

/// Detailed health report for internal load-balancing use.
pub async fn health_report(State(app): State<AppState>) -> Response {
    match overlay::evaluate_latest(&app.state, &app.config) {
        Some(report) => {
            let code = if report.healthy {
                StatusCode::OK
            } else {
                tracing::info!(status = %report.status.as_str(), "report returned 503");
                StatusCode::SERVICE_UNAVAILABLE
            };
            (code, Json(report)).into_response()
        }
        None => {
            tracing::warn!("report returned 500: no health cycle has completed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Current room census and derived totals.
pub async fn census_report(State(app): State<AppState>) -> Response {
    let census = app.state.census.load_full();
    Json((*census).clone()).into_response()
}

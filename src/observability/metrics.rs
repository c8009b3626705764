//! Metrics collection and exposition.
//!
//! # Metrics
//! - `signal_health_checks_total` (counter): HTTP summary-health queries
//! - `signal_health_checks_unhealthy_total` (counter): queries answered unhealthy
//! - `signal_unhealthy_transitions_total` (counter): healthy→unhealthy edges
//! - `signal_health` (gauge): 1 = raw healthy, 0 = raw unhealthy
//! - `signal_census` (gauge): 1 = last census poll succeeded
//! - `census_participant_sum_squared` (gauge): sum of squared room occupancy
//! - `agent_checks_total` (counter): TCP agent-check connections answered
//!
//! # Design Decisions
//! - Uses the `metrics` facade; updates are cheap atomic operations and safe
//!   to call before the recorder is installed (they become no-ops).
//! - Exposition via the Prometheus exporter's own HTTP listener on a
//!   dedicated address, kept apart from the status API.

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and exposition endpoint.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter");
        return;
    }

    describe_counter!(
        "signal_health_checks_total",
        "number of times the health check has been called"
    );
    describe_counter!(
        "signal_health_checks_unhealthy_total",
        "number of health checks answered unhealthy"
    );
    describe_counter!(
        "signal_unhealthy_transitions_total",
        "number of times the node has gone unhealthy"
    );
    describe_counter!("agent_checks_total", "number of TCP agent checks answered");
    describe_gauge!("signal_health", "1 when the node is raw healthy, else 0");
    describe_gauge!("signal_census", "1 when the last census poll succeeded, else 0");
    describe_gauge!(
        "census_participant_sum_squared",
        "sum of squared participant counts across rooms"
    );

    tracing::info!(address = %addr, "Metrics exposition started");
}

/// Record one HTTP summary-health query and its answer.
pub fn record_health_check(healthy: bool) {
    counter!("signal_health_checks_total").increment(1);
    if !healthy {
        counter!("signal_health_checks_unhealthy_total").increment(1);
    }
}

/// Record the raw health of a completed polling cycle.
pub fn record_cycle(raw_healthy: bool) {
    gauge!("signal_health").set(if raw_healthy { 1.0 } else { 0.0 });
}

/// Record a healthy→unhealthy transition.
pub fn record_unhealthy_transition() {
    counter!("signal_unhealthy_transitions_total").increment(1);
}

/// Record the outcome of a census poll.
pub fn record_census(success: bool, sum_squared_participants: u64) {
    gauge!("signal_census").set(if success { 1.0 } else { 0.0 });
    if success {
        gauge!("census_participant_sum_squared").set(sum_squared_participants as f64);
    }
}

/// Record one answered TCP agent check.
pub fn record_agent_check() {
    counter!("agent_checks_total").increment(1);
}

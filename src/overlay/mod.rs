//! Flap-mitigation overlay.
//!
//! # Data Flow
//! ```text
//! snapshot (raw probe results, per cycle)
//!     + hysteresis timestamps
//!     + current wall-clock instant
//!     → evaluate() (pure)
//!     → ReportedHealth (dampening / drain-grace applied)
//!     → weight.rs (load-balancer weight)
//!     → agent.rs (haproxy agent-check line)
//! ```
//!
//! # Design Decisions
//! - `evaluate` is pure: two calls with the same snapshot, state, and `now`
//!   yield identical output. Requests re-evaluate it against the current
//!   instant, so windows close in real time between polls.
//! - Dampening fires only on a healthy baseline, drain-grace only on an
//!   unhealthy one; the two rules are mutually exclusive by construction.

pub mod agent;
pub mod weight;

use std::time::Instant;

use serde::Serialize;

use crate::collector::state::{HealthSnapshot, HysteresisState, SidecarState};
use crate::config::SidecarConfig;
use crate::probe::ProbeOutcome;

/// Reportable node status, as understood by the load balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Ready,
    Drain,
    Maint,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Ready => "ready",
            NodeStatus::Drain => "drain",
            NodeStatus::Maint => "maint",
        }
    }

    /// Map node-status file contents to a reportable status. The `unhealthy`
    /// sentinel already forced the raw health down, so it reads as drain
    /// here; anything unrecognized is coerced to drain with a warning and
    /// never forwarded verbatim to the load balancer.
    pub fn from_contents(contents: &str) -> Self {
        match contents {
            "ready" => NodeStatus::Ready,
            "drain" => NodeStatus::Drain,
            "maint" => NodeStatus::Maint,
            "unhealthy" => NodeStatus::Drain,
            other => {
                tracing::warn!(contents = %other, "unrecognized node status, coercing to drain");
                NodeStatus::Drain
            }
        }
    }
}

/// Per-service view in the detailed report.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceCheck {
    pub reachable: bool,
    pub status_code: u16,
    /// The probe timed out rather than being refused: the service may still
    /// be up but struggling.
    pub soft_down: bool,
}

impl From<&ProbeOutcome> for ServiceCheck {
    fn from(outcome: &ProbeOutcome) -> Self {
        Self {
            reachable: outcome.reachable,
            status_code: outcome.status_code,
            soft_down: outcome.timed_out,
        }
    }
}

/// Per-source breakdown carried in the detailed report.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceReport {
    pub focus: ServiceCheck,
    pub focus_stats: ServiceCheck,
    pub xmpp: ServiceCheck,
    pub status_file_found: bool,
    pub status_file_contents: String,
}

/// Participant counters carried in the detailed report.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub participants: Option<u64>,
    pub conferences: Option<u64>,
}

/// The externally visible health report. Ephemeral: computed per request,
/// never stored.
#[derive(Debug, Clone, Serialize)]
pub struct ReportedHealth {
    /// Unix seconds of the underlying polling cycle.
    pub timestamp: u64,
    pub healthy: bool,
    /// True when dampening or drain-grace overrode the raw result.
    pub damped: bool,
    pub status: NodeStatus,
    pub weight: String,
    pub services: ServiceReport,
    pub stats: StatsReport,
    pub agent_line: String,
}

/// Apply the flap-mitigation rules to the latest raw snapshot.
///
/// Rule order: baseline from the snapshot, then health-dampening (suppress an
/// immediate flip back to healthy after a failure), then drain-grace (report
/// an isolated focus outage as a soft `drain` for a bounded window instead of
/// hard down, keeping existing sessions alive while the dependency recovers).
pub fn evaluate(
    snapshot: &HealthSnapshot,
    hysteresis: &HysteresisState,
    participants: Option<u64>,
    now: Instant,
    config: &SidecarConfig,
) -> ReportedHealth {
    let mut healthy = snapshot.raw_healthy;
    let mut status = NodeStatus::from_contents(snapshot.status_contents());
    let mut damped = false;

    if healthy {
        if let Some(went_unhealthy) = hysteresis.last_went_unhealthy {
            if now.duration_since(went_unhealthy) < config.health.dampening() {
                healthy = false;
                damped = true;
            }
        }
    } else if hysteresis.last_went_healthy.is_some() && !snapshot.focus_ok() && snapshot.xmpp_ok() {
        if let Some(episode_start) = hysteresis.first_unhealthy_in_episode {
            if now.duration_since(episode_start) < config.health.drain_grace() {
                healthy = true;
                status = NodeStatus::Drain;
                damped = true;
            }
        }
    }

    let weight = weight::weight_percent(status, participants, &config.weight);

    let mut report = ReportedHealth {
        timestamp: snapshot.taken_at,
        healthy,
        damped,
        status,
        weight,
        services: ServiceReport {
            focus: ServiceCheck::from(&snapshot.focus_health),
            focus_stats: ServiceCheck::from(&snapshot.focus_stats),
            xmpp: ServiceCheck::from(&snapshot.xmpp_health),
            status_file_found: snapshot.status_file.reachable,
            status_file_contents: snapshot.status_contents().to_string(),
        },
        stats: StatsReport {
            participants: snapshot.participants,
            conferences: snapshot.conferences,
        },
        agent_line: String::new(),
    };
    report.agent_line = agent::encode(&report);
    report
}

/// Evaluate the overlay against the latest published snapshot, or `None` if
/// no cycle has ever completed.
///
/// The participant count prefers the focus stats payload; when that is
/// unknown and census polling is enabled and has succeeded at least once, the
/// census total stands in.
pub fn evaluate_latest(state: &SidecarState, config: &SidecarConfig) -> Option<ReportedHealth> {
    let snapshot = state.latest.load_full()?;
    let hysteresis = state.hysteresis.load_full();
    let census = state.census.load_full();

    let participants = snapshot.participants.or_else(|| {
        if config.census.enabled && census.last_polled.is_some() {
            Some(census.total_participants)
        } else {
            None
        }
    });

    Some(evaluate(
        &snapshot,
        &hysteresis,
        participants,
        Instant::now(),
        config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ok_outcome(body: &str) -> ProbeOutcome {
        ProbeOutcome {
            reachable: true,
            timed_out: false,
            status_code: 200,
            body: body.to_string(),
        }
    }

    fn file_outcome(contents: &str) -> ProbeOutcome {
        ProbeOutcome {
            reachable: true,
            timed_out: false,
            status_code: 0,
            body: contents.to_string(),
        }
    }

    const STATS: &str = r#"{"participants": 10, "conferences": 2}"#;

    fn healthy_snapshot() -> HealthSnapshot {
        HealthSnapshot::from_outcomes(
            0,
            ok_outcome(""),
            ok_outcome(STATS),
            ok_outcome(""),
            file_outcome("ready"),
        )
    }

    fn focus_down_snapshot() -> HealthSnapshot {
        HealthSnapshot::from_outcomes(
            0,
            ProbeOutcome::unreachable(),
            ok_outcome(STATS),
            ok_outcome(""),
            file_outcome("ready"),
        )
    }

    fn config() -> SidecarConfig {
        let mut config = SidecarConfig::default();
        config.health.dampening_secs = 30;
        config.health.drain_grace_secs = 120;
        config
    }

    #[test]
    fn healthy_baseline_passes_through() {
        let report = evaluate(
            &healthy_snapshot(),
            &HysteresisState::default(),
            Some(10),
            Instant::now(),
            &config(),
        );
        assert!(report.healthy);
        assert!(!report.damped);
        assert_eq!(report.status, NodeStatus::Ready);
        assert_eq!(report.agent_line, "up ready 100%\n");
    }

    #[test]
    fn dampening_window_suppresses_recovery() {
        let config = config();
        let went_unhealthy = Instant::now();
        let hysteresis = HysteresisState {
            last_went_unhealthy: Some(went_unhealthy),
            ..HysteresisState::default()
        };
        let snapshot = healthy_snapshot();

        let inside = went_unhealthy + config.health.dampening() - Duration::from_secs(1);
        let report = evaluate(&snapshot, &hysteresis, Some(10), inside, &config);
        assert!(!report.healthy);
        assert!(report.damped);

        let outside = went_unhealthy + config.health.dampening() + Duration::from_secs(1);
        let report = evaluate(&snapshot, &hysteresis, Some(10), outside, &config);
        assert!(report.healthy);
        assert!(!report.damped);
    }

    #[test]
    fn drain_grace_softens_isolated_focus_outage() {
        let config = config();
        let episode_start = Instant::now();
        let hysteresis = HysteresisState {
            last_went_healthy: Some(episode_start),
            last_went_unhealthy: Some(episode_start),
            first_unhealthy_in_episode: Some(episode_start),
            last_raw_healthy: false,
        };
        let snapshot = focus_down_snapshot();

        let inside = episode_start + config.health.drain_grace() - Duration::from_secs(1);
        let report = evaluate(&snapshot, &hysteresis, Some(10), inside, &config);
        assert!(report.healthy);
        assert!(report.damped);
        assert_eq!(report.status, NodeStatus::Drain);
        assert_eq!(report.agent_line, "up drain 0%\n");

        let outside = episode_start + config.health.drain_grace() + Duration::from_secs(1);
        let report = evaluate(&snapshot, &hysteresis, Some(10), outside, &config);
        assert!(!report.healthy);
        assert!(!report.damped);
    }

    #[test]
    fn no_drain_grace_without_prior_health() {
        let config = config();
        let episode_start = Instant::now();
        let hysteresis = HysteresisState {
            last_went_healthy: None,
            last_went_unhealthy: Some(episode_start),
            first_unhealthy_in_episode: Some(episode_start),
            last_raw_healthy: false,
        };
        let report = evaluate(
            &focus_down_snapshot(),
            &hysteresis,
            Some(10),
            episode_start + Duration::from_secs(1),
            &config,
        );
        assert!(!report.healthy);
    }

    #[test]
    fn no_drain_grace_when_xmpp_also_down() {
        let config = config();
        let episode_start = Instant::now();
        let hysteresis = HysteresisState {
            last_went_healthy: Some(episode_start),
            last_went_unhealthy: Some(episode_start),
            first_unhealthy_in_episode: Some(episode_start),
            last_raw_healthy: false,
        };
        let snapshot = HealthSnapshot::from_outcomes(
            0,
            ProbeOutcome::unreachable(),
            ok_outcome(STATS),
            ProbeOutcome::unreachable(),
            file_outcome("ready"),
        );
        let report = evaluate(
            &snapshot,
            &hysteresis,
            Some(10),
            episode_start + Duration::from_secs(1),
            &config,
        );
        assert!(!report.healthy);
        assert!(!report.damped);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let config = config();
        let now = Instant::now();
        let hysteresis = HysteresisState {
            last_went_unhealthy: Some(now),
            ..HysteresisState::default()
        };
        let snapshot = healthy_snapshot();

        let a = evaluate(&snapshot, &hysteresis, Some(10), now, &config);
        let b = evaluate(&snapshot, &hysteresis, Some(10), now, &config);
        assert_eq!(a.healthy, b.healthy);
        assert_eq!(a.damped, b.damped);
        assert_eq!(a.status, b.status);
        assert_eq!(a.weight, b.weight);
        assert_eq!(a.agent_line, b.agent_line);
    }

    #[test]
    fn unrecognized_status_coerced_to_drain() {
        assert_eq!(NodeStatus::from_contents("wedged"), NodeStatus::Drain);
        assert_eq!(NodeStatus::from_contents("unhealthy"), NodeStatus::Drain);
        assert_eq!(NodeStatus::from_contents("maint"), NodeStatus::Maint);
        assert_eq!(NodeStatus::from_contents("ready"), NodeStatus::Ready);
    }
}

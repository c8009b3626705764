//! Shared poll state.
//!
//! # Responsibilities
//! - Define the immutable per-cycle health snapshot
//! - Track the hysteresis timestamps driving the flap-mitigation overlay
//! - Hold the census-derived participant counters
//! - Publish all of the above through atomically swapped references
//!
//! # Design Decisions
//! - Writers (the two timer loops) build a fresh value and `store` it; any
//!   number of request handlers `load` a consistent value without locks.
//! - The latest snapshot is `None` until the first cycle ever completes, so
//!   the transports can report "no data yet" distinctly from "unhealthy".

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use arc_swap::{ArcSwap, ArcSwapOption};
use serde::{Deserialize, Serialize};

use crate::probe::ProbeOutcome;

/// Seconds since the unix epoch, for report timestamps.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Immutable result of one full polling cycle across all probe sources.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    /// Unix seconds at which the cycle ran.
    pub taken_at: u64,
    /// Focus-service health endpoint outcome.
    pub focus_health: ProbeOutcome,
    /// Focus-service stats endpoint outcome.
    pub focus_stats: ProbeOutcome,
    /// XMPP-service health endpoint outcome.
    pub xmpp_health: ProbeOutcome,
    /// Node-status file outcome; body carries the trimmed contents.
    pub status_file: ProbeOutcome,
    /// Whether the stats body parsed as JSON.
    pub stats_parsed: bool,
    /// Participant count from the stats payload, if present.
    pub participants: Option<u64>,
    /// Conference count from the stats payload, if present.
    pub conferences: Option<u64>,
    /// Derived once per cycle; see [`HealthSnapshot::from_outcomes`].
    pub raw_healthy: bool,
}

/// Shape of the focus-service stats payload.
#[derive(Debug, Deserialize)]
struct FocusStats {
    participants: Option<u64>,
    conferences: Option<u64>,
}

impl HealthSnapshot {
    /// Fold per-source outcomes into a snapshot, parsing the stats payload
    /// and deriving `raw_healthy`: every required source reachable with a
    /// success status, stats parsed, status file readable, and its contents
    /// not the `unhealthy` sentinel.
    pub fn from_outcomes(
        taken_at: u64,
        focus_health: ProbeOutcome,
        focus_stats: ProbeOutcome,
        xmpp_health: ProbeOutcome,
        status_file: ProbeOutcome,
    ) -> Self {
        let (stats_parsed, participants, conferences) =
            match serde_json::from_str::<FocusStats>(&focus_stats.body) {
                Ok(stats) => (true, stats.participants, stats.conferences),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to parse focus stats json");
                    (false, None, None)
                }
            };

        let raw_healthy = focus_health.is_ok()
            && focus_stats.is_ok()
            && xmpp_health.is_ok()
            && status_file.reachable
            && stats_parsed
            && status_file.body != "unhealthy";

        Self {
            taken_at,
            focus_health,
            focus_stats,
            xmpp_health,
            status_file,
            stats_parsed,
            participants,
            conferences,
            raw_healthy,
        }
    }

    /// Canned all-unreachable snapshot, published when a cycle faults so the
    /// previous snapshot never goes silently stale.
    pub fn all_unreachable(taken_at: u64) -> Self {
        Self::from_outcomes(
            taken_at,
            ProbeOutcome::unreachable(),
            ProbeOutcome::unreachable(),
            ProbeOutcome::unreachable(),
            ProbeOutcome::unreachable(),
        )
    }

    /// Trimmed node-status file contents.
    pub fn status_contents(&self) -> &str {
        &self.status_file.body
    }

    /// True when the focus health endpoint answered with a success status.
    pub fn focus_ok(&self) -> bool {
        self.focus_health.is_ok()
    }

    /// True when the xmpp health endpoint answered with a success status.
    pub fn xmpp_ok(&self) -> bool {
        self.xmpp_health.is_ok()
    }
}

/// Process-lifetime hysteresis timestamps.
///
/// `None` means "never happened", which keeps every hysteresis window
/// inactive on cold start without fabricating a far-past epoch.
#[derive(Debug, Clone)]
pub struct HysteresisState {
    /// Instant of the most recent raw-healthy cycle.
    pub last_went_healthy: Option<Instant>,
    /// Instant of the most recent raw-unhealthy cycle.
    pub last_went_unhealthy: Option<Instant>,
    /// Instant of the healthy→unhealthy edge that opened the current failure
    /// episode; overwritten only on that edge, not on repeated unhealthy
    /// cycles.
    pub first_unhealthy_in_episode: Option<Instant>,
    /// `raw_healthy` of the previous cycle, for edge detection.
    pub last_raw_healthy: bool,
}

impl Default for HysteresisState {
    fn default() -> Self {
        Self {
            last_went_healthy: None,
            last_went_unhealthy: None,
            first_unhealthy_in_episode: None,
            // Treat the pre-start state as healthy so the first unhealthy
            // cycle opens a fresh episode.
            last_raw_healthy: true,
        }
    }
}

impl HysteresisState {
    /// Fold one cycle's `raw_healthy` into a successor state.
    pub fn observe(&self, raw_healthy: bool, now: Instant) -> Self {
        let mut next = self.clone();
        if raw_healthy {
            next.last_went_healthy = Some(now);
        } else {
            next.last_went_unhealthy = Some(now);
            if self.last_raw_healthy {
                next.first_unhealthy_in_episode = Some(now);
            }
        }
        next.last_raw_healthy = raw_healthy;
        next
    }
}

/// One occupied room reported by the census endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_name: String,
    #[serde(default)]
    pub participants: u64,
    #[serde(default)]
    pub created_time: u64,
}

/// Census-derived counters, replaced wholesale on each successful poll.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CensusState {
    pub rooms: Vec<Room>,
    pub total_participants: u64,
    pub sum_squared_participants: u64,
    /// Unix seconds of the last successful poll; `None` until one completes.
    pub last_polled: Option<u64>,
}

impl CensusState {
    /// Derive the participant totals from a room list. Empty is zeros, not
    /// an error.
    pub fn from_rooms(rooms: Vec<Room>, polled_at: u64) -> Self {
        let total_participants = rooms.iter().map(|r| r.participants).sum();
        let sum_squared_participants = rooms.iter().map(|r| r.participants * r.participants).sum();
        Self {
            rooms,
            total_participants,
            sum_squared_participants,
            last_polled: Some(polled_at),
        }
    }
}

/// Process-scoped shared state, written by the timer loops and read by the
/// HTTP and TCP request handlers. Injected explicitly; no ambient globals.
pub struct SidecarState {
    /// Latest health snapshot; `None` until the first cycle completes.
    pub latest: ArcSwapOption<HealthSnapshot>,
    /// Hysteresis timestamps, mutated only by the health loop.
    pub hysteresis: ArcSwap<HysteresisState>,
    /// Latest census counters.
    pub census: ArcSwap<CensusState>,
}

impl SidecarState {
    pub fn new() -> Self {
        Self {
            latest: ArcSwapOption::empty(),
            hysteresis: ArcSwap::from_pointee(HysteresisState::default()),
            census: ArcSwap::from_pointee(CensusState::default()),
        }
    }
}

impl Default for SidecarState {
    fn default() -> Self {
        Self::new()
    }
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

    const STATS: &str = r#"{"participants": 12, "conferences": 3}"#;

    #[test]
    fn all_sources_ok_is_raw_healthy() {
        let snapshot = HealthSnapshot::from_outcomes(
            0,
            ok_outcome(""),
            ok_outcome(STATS),
            ok_outcome(""),
            file_outcome("ready"),
        );
        assert!(snapshot.raw_healthy);
        assert_eq!(snapshot.participants, Some(12));
        assert_eq!(snapshot.conferences, Some(3));
    }

    #[test]
    fn unhealthy_sentinel_defeats_raw_healthy() {
        let snapshot = HealthSnapshot::from_outcomes(
            0,
            ok_outcome(""),
            ok_outcome(STATS),
            ok_outcome(""),
            file_outcome("unhealthy"),
        );
        assert!(!snapshot.raw_healthy);
    }

    #[test]
    fn stats_parse_failure_degrades_counts_not_cycle() {
        let snapshot = HealthSnapshot::from_outcomes(
            0,
            ok_outcome(""),
            ok_outcome("not json"),
            ok_outcome(""),
            file_outcome("ready"),
        );
        assert!(!snapshot.raw_healthy);
        assert!(!snapshot.stats_parsed);
        assert_eq!(snapshot.participants, None);
    }

    #[test]
    fn single_probe_failure_leaves_others_intact() {
        let snapshot = HealthSnapshot::from_outcomes(
            0,
            ProbeOutcome::unreachable(),
            ok_outcome(STATS),
            ok_outcome(""),
            file_outcome("ready"),
        );
        assert!(!snapshot.raw_healthy);
        assert!(!snapshot.focus_ok());
        assert!(snapshot.focus_stats.is_ok());
        assert!(snapshot.xmpp_ok());
        assert!(snapshot.status_file.reachable);
        assert_eq!(snapshot.participants, Some(12));
    }

    #[test]
    fn hysteresis_tracks_latest_edges() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(5);
        let t2 = t0 + Duration::from_secs(10);
        let t3 = t0 + Duration::from_secs(15);

        let state = HysteresisState::default();
        let state = state.observe(true, t0);
        assert_eq!(state.last_went_healthy, Some(t0));

        let state = state.observe(false, t1);
        assert_eq!(state.last_went_unhealthy, Some(t1));
        assert_eq!(state.first_unhealthy_in_episode, Some(t1));

        // Repeated unhealthy cycles advance the latest edge but not the
        // episode start.
        let state = state.observe(false, t2);
        assert_eq!(state.last_went_unhealthy, Some(t2));
        assert_eq!(state.first_unhealthy_in_episode, Some(t1));

        let state = state.observe(true, t3);
        assert_eq!(state.last_went_healthy, Some(t3));
        assert_eq!(state.first_unhealthy_in_episode, Some(t1));
    }

    #[test]
    fn new_episode_resets_first_unhealthy() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(5);
        let t2 = t0 + Duration::from_secs(10);

        let state = HysteresisState::default()
            .observe(false, t0)
            .observe(true, t1)
            .observe(false, t2);
        assert_eq!(state.first_unhealthy_in_episode, Some(t2));
    }

    #[test]
    fn census_totals_from_rooms() {
        let rooms = vec![
            Room {
                room_name: "a".into(),
                participants: 3,
                created_time: 1,
            },
            Room {
                room_name: "b".into(),
                participants: 4,
                created_time: 2,
            },
        ];
        let state = CensusState::from_rooms(rooms, 100);
        assert_eq!(state.total_participants, 7);
        assert_eq!(state.sum_squared_participants, 25);
        assert_eq!(state.last_polled, Some(100));
    }

    #[test]
    fn empty_census_is_zero_not_error() {
        let state = CensusState::from_rooms(Vec::new(), 100);
        assert_eq!(state.total_participants, 0);
        assert_eq!(state.sum_squared_participants, 0);
    }
}

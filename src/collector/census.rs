//! Room-census polling loop.
//!
//! # Responsibilities
//! - Poll the xmpp room-census endpoint on its own timer
//! - Derive participant totals from the room list
//! - Keep the previous census on transport or parse failures
//!
//! # Design Decisions
//! - Stale data is preferred to no data for weight computation, so a failed
//!   poll logs and leaves the published state untouched; only at process
//!   start is the census empty.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::time;

use crate::collector::state::{unix_now, CensusState, Room, SidecarState};
use crate::config::SidecarConfig;
use crate::observability::metrics;
use crate::probe::http::probe_http;

/// Shape of the room-census payload.
#[derive(Debug, Deserialize)]
struct CensusPayload {
    #[serde(default)]
    room_census: Vec<Room>,
}

pub struct CensusCollector {
    client: reqwest::Client,
    config: Arc<SidecarConfig>,
    state: Arc<SidecarState>,
}

impl CensusCollector {
    pub fn new(config: Arc<SidecarConfig>, state: Arc<SidecarState>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            state,
        }
    }

    /// Drive census cycles until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let interval = self.config.health.polling_interval();
        tracing::info!(
            interval_secs = self.config.health.polling_interval_secs,
            url = %self.config.upstream.census_url(),
            "Census collector starting"
        );

        let mut ticker = time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Census collector received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Poll once; publish derived counters on success, keep the prior state
    /// otherwise.
    pub async fn run_cycle(&self) {
        let url = self.config.upstream.census_url();
        let outcome = probe_http(
            &self.client,
            &url,
            self.config.health.probe_timeout(),
            self.config.health.probe_retries,
        )
        .await;

        if !outcome.is_ok() {
            tracing::warn!(
                url = %url,
                reachable = outcome.reachable,
                status_code = outcome.status_code,
                "census poll failed, keeping previous census"
            );
            metrics::record_census(false, 0);
            return;
        }

        let rooms = match serde_json::from_str::<CensusPayload>(&outcome.body) {
            Ok(payload) => payload.room_census,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "census payload malformed, keeping previous census");
                metrics::record_census(false, 0);
                return;
            }
        };

        let census = CensusState::from_rooms(rooms, unix_now());
        tracing::debug!(
            rooms = census.rooms.len(),
            total_participants = census.total_participants,
            "census cycle complete"
        );
        metrics::record_census(true, census.sum_squared_participants);
        self.state.census.store(Arc::new(census));
    }
}

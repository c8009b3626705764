//! Health polling loop.
//!
//! # Responsibilities
//! - Fan out all configured probes concurrently once per cycle
//! - Fold per-source outcomes into an immutable snapshot
//! - Publish the snapshot atomically and advance the hysteresis timestamps
//! - Re-arm on a fixed timer regardless of outcome
//!
//! # Design Decisions
//! - Probes run as separate tasks and the cycle waits for all of them to
//!   settle; one slow or failed probe never blocks or invalidates the others.
//! - If the join itself faults, a canned all-unreachable snapshot is
//!   published so the previous snapshot never goes silently stale.
//! - Cycles never overlap: the next tick is awaited only after the current
//!   cycle fully completes, which serializes all writes to shared state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time;

use crate::collector::state::{unix_now, HealthSnapshot, SidecarState};
use crate::config::SidecarConfig;
use crate::observability::metrics;
use crate::probe::file::probe_status_file;
use crate::probe::http::probe_http;

/// How often the poll-rate accounting line is logged.
const POLL_CHECK_DURATION: Duration = Duration::from_secs(3600);

pub struct HealthCollector {
    client: reqwest::Client,
    config: Arc<SidecarConfig>,
    state: Arc<SidecarState>,
}

impl HealthCollector {
    pub fn new(config: Arc<SidecarConfig>, state: Arc<SidecarState>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            state,
        }
    }

    /// Drive polling cycles until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let interval = self.config.health.polling_interval();
        tracing::info!(
            interval_secs = self.config.health.polling_interval_secs,
            focus = %self.config.upstream.focus_base_url,
            xmpp = %self.config.upstream.xmpp_base_url,
            "Health collector starting"
        );

        let ideal_cycles =
            POLL_CHECK_DURATION.as_secs() / self.config.health.polling_interval_secs.max(1);
        let mut cycles_attempted: u64 = 0;
        let mut last_rate_check = Instant::now();

        // Suppress the spurious transition log on process start.
        let mut was_healthy = true;

        let mut ticker = time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cycles_attempted += 1;
                    let elapsed = last_rate_check.elapsed();
                    if elapsed > POLL_CHECK_DURATION {
                        tracing::info!(
                            attempted = cycles_attempted,
                            elapsed_secs = elapsed.as_secs(),
                            target = ideal_cycles,
                            "health poll rate check"
                        );
                        last_rate_check = Instant::now();
                        cycles_attempted = 0;
                    }

                    let snapshot = self.run_cycle().await;
                    if was_healthy && !snapshot.raw_healthy {
                        tracing::info!("signal node state changed from healthy to unhealthy");
                        metrics::record_unhealthy_transition();
                    } else if !was_healthy && snapshot.raw_healthy {
                        tracing::info!("signal node state changed from unhealthy to healthy");
                    }
                    was_healthy = snapshot.raw_healthy;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health collector received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one polling cycle: probe every source concurrently, fold the
    /// outcomes into a snapshot, publish it, and advance hysteresis.
    pub async fn run_cycle(&self) -> HealthSnapshot {
        let timeout = self.config.health.probe_timeout();
        let retries = self.config.health.probe_retries;

        let focus_health = {
            let client = self.client.clone();
            let url = self.config.upstream.focus_health_url();
            tokio::spawn(async move { probe_http(&client, &url, timeout, retries).await })
        };
        let focus_stats = {
            let client = self.client.clone();
            let url = self.config.upstream.focus_stats_url();
            tokio::spawn(async move { probe_http(&client, &url, timeout, retries).await })
        };
        let xmpp_health = {
            let client = self.client.clone();
            let url = self.config.upstream.xmpp_health_url();
            tokio::spawn(async move { probe_http(&client, &url, timeout, retries).await })
        };
        let status_file = {
            let path = self.config.upstream.status_file_path.clone();
            tokio::task::spawn_blocking(move || probe_status_file(&path))
        };

        // Wait for all to settle. Individual probe failures are already data
        // in the outcomes; a failed join means the cycle itself faulted.
        let joined = tokio::join!(focus_health, focus_stats, xmpp_health, status_file);
        let now = unix_now();
        let snapshot = match joined {
            (Ok(focus_health), Ok(focus_stats), Ok(xmpp_health), Ok(status_file)) => {
                HealthSnapshot::from_outcomes(now, focus_health, focus_stats, xmpp_health, status_file)
            }
            _ => {
                tracing::error!("health cycle join failed, publishing all-unreachable snapshot");
                HealthSnapshot::all_unreachable(now)
            }
        };

        tracing::debug!(
            raw_healthy = snapshot.raw_healthy,
            status = %snapshot.status_contents(),
            participants = ?snapshot.participants,
            "health cycle complete"
        );
        metrics::record_cycle(snapshot.raw_healthy);

        let hysteresis = self.state.hysteresis.load();
        let next = hysteresis.observe(snapshot.raw_healthy, Instant::now());
        self.state.hysteresis.store(Arc::new(next));
        self.state.latest.store(Some(Arc::new(snapshot.clone())));

        snapshot
    }
}

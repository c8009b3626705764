//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sidecar.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the sidecar.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SidecarConfig {
    /// HTTP status API settings.
    pub http: HttpConfig,

    /// TCP agent-check listener settings.
    pub agent: AgentConfig,

    /// Upstream endpoints and the node-status file.
    pub upstream: UpstreamConfig,

    /// Polling and hysteresis settings.
    pub health: HealthConfig,

    /// Load-balancer weight settings.
    pub weight: WeightConfig,

    /// Room-census polling settings.
    pub census: CensusConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (e.g., "0.0.0.0:6000").
    pub bind_address: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:6000".to_string(),
        }
    }
}

/// TCP agent-check listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Bind address for the haproxy agent-check port.
    pub bind_address: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:6060".to_string(),
        }
    }
}

/// Upstream endpoints probed each cycle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the conference focus service.
    pub focus_base_url: String,

    /// Base URL of the xmpp service REST API.
    pub xmpp_base_url: String,

    /// Path of the file an operator writes `ready`/`drain`/`maint` to.
    pub status_file_path: PathBuf,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            focus_base_url: "http://localhost:8888".to_string(),
            xmpp_base_url: "http://localhost:5280".to_string(),
            status_file_path: PathBuf::from("/etc/signal/node-status"),
        }
    }
}

impl UpstreamConfig {
    pub fn focus_health_url(&self) -> String {
        format!("{}/about/health", self.focus_base_url)
    }

    pub fn focus_stats_url(&self) -> String {
        format!("{}/stats", self.focus_base_url)
    }

    pub fn xmpp_health_url(&self) -> String {
        format!("{}/http-bind", self.xmpp_base_url)
    }

    pub fn census_url(&self) -> String {
        format!("{}/room-census", self.xmpp_base_url)
    }
}

/// Polling cadence, probe bounds, and hysteresis windows.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Seconds between polling cycles.
    pub polling_interval_secs: u64,

    /// Seconds the report stays unhealthy after the most recent unhealthy
    /// cycle, suppressing an immediate flip back to healthy.
    pub dampening_secs: u64,

    /// Seconds an isolated focus-service outage is reported as `drain`
    /// instead of hard down. Must exceed `dampening_secs`; auto-corrected
    /// otherwise.
    pub drain_grace_secs: u64,

    /// Per-probe timeout in seconds.
    pub probe_timeout_secs: u64,

    /// Transport-level retries per probe.
    pub probe_retries: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            polling_interval_secs: 5,
            dampening_secs: 30,
            drain_grace_secs: 120,
            probe_timeout_secs: 3,
            probe_retries: 2,
        }
    }
}

impl HealthConfig {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    pub fn dampening(&self) -> Duration {
        Duration::from_secs(self.dampening_secs)
    }

    pub fn drain_grace(&self) -> Duration {
        Duration::from_secs(self.drain_grace_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Load-balancer weight configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Scale the reported weight by participant load. When disabled the
    /// weight is always 100%.
    pub enabled: bool,

    /// Participant capacity of the node.
    pub participant_max: u64,

    /// Weight floor so an otherwise-healthy node never reads as fully down.
    pub minimum_percent: u64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            participant_max: 5000,
            minimum_percent: 10,
        }
    }
}

/// Room-census polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CensusConfig {
    /// Poll the room census and expose `/signal/census`.
    pub enabled: bool,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self { enabled: false }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus exposition endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

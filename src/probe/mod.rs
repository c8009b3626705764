//! Probe executors.
//!
//! # Data Flow
//! ```text
//! http.rs:
//!     Bounded-timeout GET against an upstream endpoint
//!     → ProbeOutcome (reachable, status code, body)
//!
//! file.rs:
//!     Synchronous read of the local node-status file
//!     → ProbeOutcome (reachable = readable, body = trimmed contents)
//! ```
//!
//! # Design Decisions
//! - A probe never returns an error: every failure mode is represented in
//!   the outcome record, so the collector can fan probes out and fold each
//!   result in independently.
//! - Timeouts are distinguished from other unreachability because the
//!   overlay treats them as a soft-down signal.
//! - Retries are transport-level only and bounded; a non-2xx response is
//!   data, not a failure to retry.

pub mod file;
pub mod http;

/// Uniform result of one bounded-time check against one source.
#[derive(Debug, Clone, Default)]
pub struct ProbeOutcome {
    /// Whether the source answered at all.
    pub reachable: bool,
    /// Whether the failure was specifically a timeout (soft-down signal).
    pub timed_out: bool,
    /// HTTP status code; 0 when unreachable or for the file probe.
    pub status_code: u16,
    /// Response body or trimmed file contents.
    pub body: String,
}

impl ProbeOutcome {
    /// Canned outcome for a source that could not be reached.
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// True when the source answered with a success status.
    pub fn is_ok(&self) -> bool {
        self.reachable && self.status_code == 200
    }
}

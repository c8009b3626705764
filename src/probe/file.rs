//! Node-status file probe.

use std::fs;
use std::path::Path;

use super::ProbeOutcome;

/// Read the local node-status file with the same outcome shape as an HTTP
/// probe: `reachable` means the file was readable, the status code is unused,
/// and the body carries the trimmed contents (`ready`, `drain`, `maint`,
/// `unhealthy`, or whatever an operator wrote there).
pub fn probe_status_file(path: &Path) -> ProbeOutcome {
    tracing::debug!(path = %path.display(), "reading status file");

    match fs::read_to_string(path) {
        Ok(contents) => ProbeOutcome {
            reachable: true,
            timed_out: false,
            status_code: 0,
            body: contents.trim().to_string(),
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "status file read failed");
            ProbeOutcome::unreachable()
        }
    }
}

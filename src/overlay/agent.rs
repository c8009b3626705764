//! haproxy agent-check line encoding.
//!
//! The agent protocol is a single space-separated text line,
//! `{up|down} {ready|drain|maint} {weight}`, newline-terminated. The line is
//! the entire wire payload of one TCP agent-check exchange.

use crate::overlay::ReportedHealth;

/// Fixed fail-safe line, emitted when no report can be produced (no polling
/// cycle has ever completed). Reads as hard down with no weight.
pub const FAIL_SAFE_LINE: &str = "down drain\n";

/// Render a report as the agent-check line.
pub fn encode(report: &ReportedHealth) -> String {
    let health = if report.healthy { "up" } else { "down" };
    format!("{} {} {}\n", health, report.status.as_str(), report.weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{NodeStatus, ServiceCheck, ServiceReport, StatsReport};

    fn report(healthy: bool, status: NodeStatus, weight: &str) -> ReportedHealth {
        let check = ServiceCheck {
            reachable: true,
            status_code: 200,
            soft_down: false,
        };
        ReportedHealth {
            timestamp: 0,
            healthy,
            damped: false,
            status,
            weight: weight.to_string(),
            services: ServiceReport {
                focus: check.clone(),
                focus_stats: check.clone(),
                xmpp: check,
                status_file_found: true,
                status_file_contents: status.as_str().to_string(),
            },
            stats: StatsReport {
                participants: Some(0),
                conferences: Some(0),
            },
            agent_line: String::new(),
        }
    }

    #[test]
    fn encodes_up_ready_with_weight() {
        let line = encode(&report(true, NodeStatus::Ready, "85%"));
        assert_eq!(line, "up ready 85%\n");
    }

    #[test]
    fn encodes_down_and_drain() {
        assert_eq!(encode(&report(false, NodeStatus::Drain, "0%")), "down drain 0%\n");
        assert_eq!(encode(&report(true, NodeStatus::Maint, "0%")), "up maint 0%\n");
    }

    #[test]
    fn fail_safe_is_down_drain() {
        assert_eq!(FAIL_SAFE_LINE, "down drain\n");
    }
}

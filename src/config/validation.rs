//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and addresses
//! - Auto-correct the drain-grace/dampening ordering invariant
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - The drain-grace window must outlast the dampening window it precedes;
//!   a violation is corrected with a warning rather than rejected, so a
//!   misconfigured node still comes up signaling conservatively.

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::SidecarConfig;

/// Error type for semantic configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field} address `{value}`")]
    BadAddress { field: &'static str, value: String },

    #[error("invalid {field} url `{value}`")]
    BadUrl { field: &'static str, value: String },

    #[error("polling_interval_secs must be greater than zero")]
    ZeroPollingInterval,

    #[error("participant_max must be greater than zero")]
    ZeroParticipantMax,
}

/// Validate a configuration, correcting what can be corrected in place.
pub fn validate_config(config: &mut SidecarConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&config.http.bind_address, "http.bind_address", &mut errors);
    check_addr(&config.agent.bind_address, "agent.bind_address", &mut errors);
    if config.observability.metrics_enabled {
        check_addr(
            &config.observability.metrics_address,
            "observability.metrics_address",
            &mut errors,
        );
    }

    check_url(&config.upstream.focus_base_url, "upstream.focus_base_url", &mut errors);
    check_url(&config.upstream.xmpp_base_url, "upstream.xmpp_base_url", &mut errors);

    if config.health.polling_interval_secs == 0 {
        errors.push(ValidationError::ZeroPollingInterval);
    }
    if config.weight.enabled && config.weight.participant_max == 0 {
        errors.push(ValidationError::ZeroParticipantMax);
    }

    // If the drain-grace window closed before the dampening window it is
    // meant to precede, the report could oscillate within a single failure
    // episode. Correct rather than reject.
    if config.health.drain_grace_secs <= config.health.dampening_secs {
        let corrected = config.health.dampening_secs + 1;
        tracing::warn!(
            drain_grace_secs = config.health.drain_grace_secs,
            dampening_secs = config.health.dampening_secs,
            corrected,
            "drain_grace_secs must exceed dampening_secs; correcting"
        );
        config.health.drain_grace_secs = corrected;
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(value: &str, field: &'static str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(value: &str, field: &'static str, errors: &mut Vec<ValidationError>) {
    if Url::parse(value).is_err() {
        errors.push(ValidationError::BadUrl {
            field,
            value: value.to_string(),
        });
    }
}

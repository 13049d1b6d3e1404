//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check interface names are present and unique
//! - Validate value ranges (probe timeout below interval, thresholds)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FailoverConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{FailoverConfig, ProbeKind};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no interfaces configured")]
    NoInterfaces,

    #[error("interface #{0} has an empty name")]
    EmptyInterfaceName(usize),

    #[error("interface {0} is listed more than once")]
    DuplicateInterface(String),

    #[error("interface {0} uses the ping probe but has no targets")]
    MissingTargets(String),

    #[error("probe.timeout_ms ({timeout_ms}) must be less than probe.interval_ms ({interval_ms})")]
    ProbeTimeoutTooLong { timeout_ms: u64, interval_ms: u64 },

    #[error(
        "probe.timeout_ms ({timeout_ms}) is too short for {ping_count} pings, need at least {required_ms}"
    )]
    PingTimeoutTooShort {
        timeout_ms: u64,
        required_ms: u64,
        ping_count: u32,
    },

    #[error("probe.timeout_ms must be greater than zero")]
    ZeroProbeTimeout,

    #[error("probe.packet_loss_threshold must be at most 100, got {0}")]
    PacketLossThreshold(u8),

    #[error("health.debounce_samples must be at least 1")]
    ZeroDebounce,

    #[error("route.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("route.resync_interval_secs must be greater than zero")]
    ZeroResyncInterval,

    #[error("{field} is not a valid socket address: {value}")]
    BadAddress { field: &'static str, value: String },
}

/// Validate a loaded configuration. Expects `normalize()` to have run.
pub fn validate_config(config: &FailoverConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.interfaces.is_empty() {
        errors.push(ValidationError::NoInterfaces);
    }

    let mut seen = HashSet::new();
    for (idx, iface) in config.interfaces.iter().enumerate() {
        if iface.name.trim().is_empty() {
            errors.push(ValidationError::EmptyInterfaceName(idx));
            continue;
        }
        if !seen.insert(iface.name.as_str()) {
            errors.push(ValidationError::DuplicateInterface(iface.name.clone()));
        }
        if iface.probe == ProbeKind::Ping && iface.targets.is_empty() {
            errors.push(ValidationError::MissingTargets(iface.name.clone()));
        }
    }

    let probe = &config.probe;
    if probe.timeout_ms == 0 {
        errors.push(ValidationError::ZeroProbeTimeout);
    }
    if probe.timeout_ms >= probe.interval_ms {
        errors.push(ValidationError::ProbeTimeoutTooLong {
            timeout_ms: probe.timeout_ms,
            interval_ms: probe.interval_ms,
        });
    }
    let pings = config.interfaces.iter().any(|i| i.probe == ProbeKind::Ping);
    if pings && probe.timeout_ms < probe.min_ping_timeout_ms() {
        errors.push(ValidationError::PingTimeoutTooShort {
            timeout_ms: probe.timeout_ms,
            required_ms: probe.min_ping_timeout_ms(),
            ping_count: probe.ping_count,
        });
    }
    if probe.packet_loss_threshold > 100 {
        errors.push(ValidationError::PacketLossThreshold(probe.packet_loss_threshold));
    }

    if config.health.debounce_samples == 0 {
        errors.push(ValidationError::ZeroDebounce);
    }
    if config.route.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }
    if config.route.resync_interval_secs == 0 {
        errors.push(ValidationError::ZeroResyncInterval);
    }

    if config.api.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress {
            field: "api.bind_address",
            value: config.api.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::BadAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

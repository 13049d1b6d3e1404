//! Error types shared across the control plane.
//!
//! Link-level unreliability never shows up here: probes and evaluators model
//! it as data. Only the operator-facing override path and the route apply
//! step produce errors.

use std::time::Duration;

use thiserror::Error;

use crate::health::HealthState;

/// Errors surfaced to callers of the control API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FailoverError {
    /// The override named an interface that is not configured.
    #[error("unknown interface: {0}")]
    UnknownInterface(String),

    /// The override named an interface that is not currently UP.
    #[error("interface {name} is {health}, refusing to install a default route through it")]
    InterfaceNotUp { name: String, health: HealthState },

    /// The route controller gave up on a decision.
    #[error("failed to make {interface} the default gateway after {attempts} attempt(s): {reason}")]
    ApplyFailed {
        interface: String,
        attempts: u32,
        reason: String,
    },

    /// The override did not resolve within the configured deadline.
    #[error("override request timed out after {0:?}")]
    Timeout(Duration),

    /// The coordinator loop has exited.
    #[error("coordinator is not running")]
    CoordinatorStopped,
}

/// Errors from reading or mutating the system routing table.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("failed to read routing table: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed routing table line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("`{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("interface {0} has no default route to promote")]
    NoDefaultRoute(String),
}

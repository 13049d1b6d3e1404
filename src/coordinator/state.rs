//! Coordinator phase and status snapshots.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::HealthState;

/// Lifecycle phase of the control loop.
///
/// ```text
/// Initializing → Steady:   a gateway is applied or confirmed healthy
/// Initializing → Degraded: every interface has a verdict and none is UP
/// Steady → Degraded:       no viable interface, or an automatic apply failed
/// Degraded → Steady:       a later evaluation applies a gateway
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Initializing,
    Steady,
    Degraded,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initializing => write!(f, "initializing"),
            Phase::Steady => write!(f, "steady"),
            Phase::Degraded => write!(f, "degraded"),
        }
    }
}

/// Health of one managed interface at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceStatus {
    pub name: String,
    pub priority: u32,
    pub health: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<DateTime<Utc>>,
}

//! Interface health state.
//!
//! # States
//! - Unknown: no stable verdict yet (startup)
//! - Up: interface may carry the default route
//! - Down: interface excluded from selection
//!
//! # State Transitions
//! ```text
//! Unknown → Up/Down: first run of `debounce_samples` identical samples
//! Up → Down: `debounce_samples` consecutive unreachable samples
//! Down → Up: `debounce_samples` consecutive reachable samples
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Debounced health verdict for one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthState {
    #[default]
    Unknown,
    Up,
    Down,
}

impl HealthState {
    pub fn is_up(self) -> bool {
        self == HealthState::Up
    }

    /// Verdict a run of identical samples would settle on.
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            HealthState::Up
        } else {
            HealthState::Down
        }
    }

    /// Gauge value exported for this state.
    pub fn as_gauge(self) -> f64 {
        match self {
            HealthState::Up => 1.0,
            HealthState::Down => 0.0,
            HealthState::Unknown => -1.0,
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::Unknown => write!(f, "UNKNOWN"),
            HealthState::Up => write!(f, "UP"),
            HealthState::Down => write!(f, "DOWN"),
        }
    }
}

/// Emitted by an evaluator when a verdict changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthTransition {
    pub interface: String,
    pub from: HealthState,
    pub to: HealthState,
    pub at: DateTime<Utc>,
}

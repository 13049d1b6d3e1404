//! Gateway selection policy.
//!
//! # Precedence
//! 1. Override naming an UP interface: switch to it (`ManualOverride`)
//! 2. Override naming anything else: rejected, no decision
//! 3. Current gateway is UP: no change
//! 4. Otherwise: highest-priority UP interface (`AutoFailover`), or
//!    `NoViableInterface` when nothing is UP
//!
//! # Design Decisions
//! - Pure function of its inputs; the coordinator owns all state
//! - Stability beats priority: a healthy gateway is never preempted automatically
//! - Equal priorities break ties on the lexicographically smaller name

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use serde::Serialize;

use crate::error::FailoverError;
use crate::health::HealthState;

/// Why a switch was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchReason {
    AutoFailover,
    ManualOverride,
    Startup,
}

impl fmt::Display for SwitchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchReason::AutoFailover => write!(f, "auto-failover"),
            SwitchReason::ManualOverride => write!(f, "manual-override"),
            SwitchReason::Startup => write!(f, "startup"),
        }
    }
}

/// Outcome of one selection round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    NoChange,
    Switch { interface: String, reason: SwitchReason },
    NoViableInterface,
}

/// Operator request to force an interface active.
#[derive(Debug, Clone)]
pub struct OverrideRequest {
    pub interface: String,
    pub requested_at: Instant,
}

impl OverrideRequest {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            requested_at: Instant::now(),
        }
    }
}

/// Decide which interface should carry the default route next.
///
/// `priorities` defines the managed interface set; interfaces missing from
/// `health` are treated as `Unknown`.
pub fn select(
    current: Option<&str>,
    health: &HashMap<String, HealthState>,
    priorities: &HashMap<String, u32>,
    override_request: Option<&OverrideRequest>,
) -> Result<Decision, FailoverError> {
    let health_of = |name: &str| health.get(name).copied().unwrap_or_default();

    if let Some(request) = override_request {
        let name = request.interface.as_str();
        if !priorities.contains_key(name) {
            return Err(FailoverError::UnknownInterface(name.to_string()));
        }
        let state = health_of(name);
        if !state.is_up() {
            return Err(FailoverError::InterfaceNotUp {
                name: name.to_string(),
                health: state,
            });
        }
        return Ok(Decision::Switch {
            interface: name.to_string(),
            reason: SwitchReason::ManualOverride,
        });
    }

    if let Some(gw) = current {
        if health_of(gw).is_up() {
            return Ok(Decision::NoChange);
        }
    }

    let best = priorities
        .iter()
        .filter(|(name, _)| health_of(name).is_up())
        .min_by(|(a_name, a_prio), (b_name, b_prio)| {
            a_prio.cmp(b_prio).then_with(|| a_name.cmp(b_name))
        });

    Ok(match best {
        Some((name, _)) => Decision::Switch {
            interface: name.clone(),
            reason: SwitchReason::AutoFailover,
        },
        None => Decision::NoViableInterface,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, u32, HealthState)]) -> (HashMap<String, HealthState>, HashMap<String, u32>) {
        let health = entries.iter().map(|(n, _, h)| (n.to_string(), *h)).collect();
        let prio = entries.iter().map(|(n, p, _)| (n.to_string(), *p)).collect();
        (health, prio)
    }

    use HealthState::{Down, Unknown, Up};

    #[test]
    fn test_healthy_gateway_is_kept() {
        let (health, prio) = table(&[("eth0", 2, Up), ("eth1", 1, Up)]);
        assert_eq!(select(Some("eth0"), &health, &prio, None).unwrap(), Decision::NoChange);
    }

    #[test]
    fn test_failover_picks_highest_priority_up() {
        let (health, prio) = table(&[("eth0", 2, Down), ("eth1", 1, Up), ("eth2", 3, Up)]);
        assert_eq!(
            select(Some("eth0"), &health, &prio, None).unwrap(),
            Decision::Switch { interface: "eth1".into(), reason: SwitchReason::AutoFailover }
        );
    }

    #[test]
    fn test_unset_gateway_selects_best() {
        let (health, prio) = table(&[("eth0", 1, Unknown), ("wwan0", 5, Up)]);
        assert_eq!(
            select(None, &health, &prio, None).unwrap(),
            Decision::Switch { interface: "wwan0".into(), reason: SwitchReason::AutoFailover }
        );
    }

    #[test]
    fn test_no_viable_interface() {
        let (health, prio) = table(&[("eth0", 1, Down), ("eth1", 2, Down), ("eth2", 3, Unknown)]);
        assert_eq!(select(Some("eth0"), &health, &prio, None).unwrap(), Decision::NoViableInterface);
        assert_eq!(select(None, &health, &prio, None).unwrap(), Decision::NoViableInterface);
    }

    #[test]
    fn test_tie_break_is_lexicographic_and_stable() {
        let (health, prio) = table(&[("wlan0", 1, Up), ("eth1", 1, Up), ("usb0", 1, Up)]);
        for _ in 0..16 {
            assert_eq!(
                select(None, &health, &prio, None).unwrap(),
                Decision::Switch { interface: "eth1".into(), reason: SwitchReason::AutoFailover }
            );
        }
    }

    #[test]
    fn test_override_wins_over_stability_and_priority() {
        let (health, prio) = table(&[("eth0", 1, Up), ("usb0", 9, Up)]);
        let req = OverrideRequest::new("usb0");
        assert_eq!(
            select(Some("eth0"), &health, &prio, Some(&req)).unwrap(),
            Decision::Switch { interface: "usb0".into(), reason: SwitchReason::ManualOverride }
        );
    }

    #[test]
    fn test_override_to_down_interface_rejected() {
        let (health, prio) = table(&[("eth0", 1, Up), ("eth2", 2, Down)]);
        let err = select(Some("eth0"), &health, &prio, Some(&OverrideRequest::new("eth2"))).unwrap_err();
        assert_eq!(err, FailoverError::InterfaceNotUp { name: "eth2".into(), health: Down });
    }

    #[test]
    fn test_override_to_unknown_state_rejected() {
        let (health, prio) = table(&[("eth0", 1, Up), ("eth3", 2, Unknown)]);
        let err = select(Some("eth0"), &health, &prio, Some(&OverrideRequest::new("eth3"))).unwrap_err();
        assert!(matches!(err, FailoverError::InterfaceNotUp { health: Unknown, .. }));
    }

    #[test]
    fn test_override_to_unconfigured_interface_rejected() {
        let (health, prio) = table(&[("eth0", 1, Up)]);
        let err = select(Some("eth0"), &health, &prio, Some(&OverrideRequest::new("tun0"))).unwrap_err();
        assert_eq!(err, FailoverError::UnknownInterface("tun0".into()));
    }
}

//! Debounced health evaluation.
//!
//! One evaluator per interface, owned by the coordinator. It counts runs of
//! identical samples and only moves the verdict once a run reaches the
//! debounce threshold.

use chrono::{DateTime, Utc};

use crate::health::state::{HealthState, HealthTransition};
use crate::probe::ProbeSample;

/// Per-interface debounce state machine.
#[derive(Debug, Clone)]
pub struct HealthEvaluator {
    interface: String,
    state: HealthState,
    threshold: u32,
    /// Value of the current run of identical samples.
    run_value: Option<bool>,
    /// Length of the current run.
    run_length: u32,
    last_checked_at: Option<DateTime<Utc>>,
}

impl HealthEvaluator {
    /// Create an evaluator in the `Unknown` state. A zero threshold is treated as 1.
    pub fn new(interface: impl Into<String>, threshold: u32) -> Self {
        Self {
            interface: interface.into(),
            state: HealthState::Unknown,
            threshold: threshold.max(1),
            run_value: None,
            run_length: 0,
            last_checked_at: None,
        }
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    /// Timestamp of the most recent sample, if any.
    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.last_checked_at
    }

    /// Feed one sample. Returns a transition only when the verdict changes.
    pub fn observe(&mut self, sample: &ProbeSample) -> Option<HealthTransition> {
        self.last_checked_at = Some(sample.at);

        if self.run_value == Some(sample.reachable) {
            self.run_length = self.run_length.saturating_add(1);
        } else {
            self.run_value = Some(sample.reachable);
            self.run_length = 1;
        }

        let target = HealthState::from_reachable(sample.reachable);
        if self.run_length < self.threshold || self.state == target {
            return None;
        }

        let from = self.state;
        self.state = target;
        Some(HealthTransition {
            interface: self.interface.clone(),
            from,
            to: target,
            at: sample.at,
        })
    }
}

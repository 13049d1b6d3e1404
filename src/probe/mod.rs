//! Interface probing subsystem.
//!
//! # Data Flow
//! ```text
//! runner.rs (one task per interface)
//!     → every probe.interval: LinkMonitor::check, bounded by probe.timeout
//!     → ProbeSample { interface, reachable, at }
//!     → coordinator sample channel
//! ```
//!
//! # Design Decisions
//! - A failed or timed out probe is a `false` sample, never an error
//! - Monitors keep no state between calls
//! - The timeout is strictly shorter than the interval so samples never pile up

pub mod operstate;
pub mod ping;
pub mod runner;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::{InterfaceConfig, ProbeConfig, ProbeKind};

pub use operstate::OperstateMonitor;
pub use ping::PingMonitor;
pub use runner::ProbeRunner;

/// One timestamped reachability observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSample {
    pub interface: String,
    pub reachable: bool,
    pub at: DateTime<Utc>,
}

impl ProbeSample {
    pub fn now(interface: impl Into<String>, reachable: bool) -> Self {
        Self {
            interface: interface.into(),
            reachable,
            at: Utc::now(),
        }
    }
}

/// Capability that answers "can this interface reach its targets right now?".
///
/// Implementations must swallow their own failures and answer `false`.
#[async_trait]
pub trait LinkMonitor: Send + Sync {
    async fn check(&self, interface: &InterfaceConfig) -> bool;
}

/// Build the monitor configured for an interface.
pub fn monitor_for(kind: ProbeKind, config: &ProbeConfig) -> Arc<dyn LinkMonitor> {
    match kind {
        ProbeKind::Ping => Arc::new(PingMonitor::from_config(config)),
        ProbeKind::Operstate => Arc::new(OperstateMonitor::new()),
    }
}

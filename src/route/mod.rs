//! Default route management subsystem.
//!
//! # Data Flow
//! ```text
//! Decision::Switch { interface }
//!     → controller.rs (read table, promote, verify, retry with backoff)
//!     → table.rs RouteTable capability
//!         - linux.rs (/proc/net/route + `ip route`)
//!         - memory.rs (dry-run and tests)
//!     → GatewayState updated only after verification
//! ```

pub mod controller;
pub mod linux;
pub mod memory;
pub mod table;

use std::sync::Arc;

use crate::config::{InterfaceConfig, RouteBackend};

pub use controller::{ApplyOutcome, RouteChange, RouteController};
pub use linux::LinuxRouteTable;
pub use memory::MemoryRouteTable;
pub use table::{primary_route, RouteTable, RoutingEntry};

/// Build the configured routing table backend.
pub fn table_for(backend: RouteBackend, interfaces: &[InterfaceConfig]) -> Arc<dyn RouteTable> {
    match backend {
        RouteBackend::Linux => Arc::new(LinuxRouteTable::new()),
        RouteBackend::DryRun => Arc::new(MemoryRouteTable::seeded(interfaces)),
    }
}

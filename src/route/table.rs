//! Routing table abstraction.

use std::fmt;
use std::net::Ipv4Addr;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::RouteError;

/// One IPv4 default route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingEntry {
    pub interface: String,
    pub gateway: Ipv4Addr,
    pub metric: u32,
}

impl RoutingEntry {
    pub fn new(interface: impl Into<String>, gateway: Ipv4Addr, metric: u32) -> Self {
        Self {
            interface: interface.into(),
            gateway,
            metric,
        }
    }
}

impl fmt::Display for RoutingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "default via {} dev {} metric {}", self.gateway, self.interface, self.metric)
    }
}

/// Capability over the system's default routes.
///
/// Implementations must be safe to call repeatedly; the controller verifies
/// every mutation by reading the table back.
#[async_trait]
pub trait RouteTable: Send + Sync {
    /// All default routes currently installed, in table order.
    async fn default_routes(&self) -> Result<Vec<RoutingEntry>, RouteError>;

    /// Make `interface` the preferred default route.
    ///
    /// Must leave the table untouched when `interface` already is the primary.
    async fn promote(&self, interface: &str) -> Result<(), RouteError>;
}

/// The default route the kernel uses: lowest metric, first in table order on ties.
pub fn primary_route(routes: &[RoutingEntry]) -> Option<&RoutingEntry> {
    let mut best: Option<&RoutingEntry> = None;
    for entry in routes {
        match best {
            Some(b) if entry.metric > b.metric => {}
            Some(b) if entry.metric == b.metric => {
                tracing::warn!(first = %b, second = %entry, "Two default routes share the lowest metric");
            }
            _ => best = Some(entry),
        }
    }
    best
}

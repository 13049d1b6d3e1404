//! Route controller.
//!
//! # Responsibilities
//! - Apply a gateway decision to the routing table, idempotently
//! - Verify every mutation by reading the table back
//! - Retry with backoff, then give up with a reportable failure
//! - Own the applied GatewayState (`current()`)
//! - Notice default route changes made outside the control plane
//!
//! # Design Decisions
//! - The table is read before mutating; an interface that already is the
//!   primary default route costs no mutation
//! - `current()` is what the controller believes is applied, and is the
//!   only source for the default gateway query

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::RouteConfig;
use crate::error::{FailoverError, RouteError};
use crate::resilience::backoff::calculate_backoff;
use crate::route::table::{primary_route, RouteTable, RoutingEntry};

/// Result of a successful `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The interface already was the default route.
    Unchanged,
    /// The table was reprogrammed and verified.
    Applied { attempts: u32 },
}

/// Result of re-reading the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteChange {
    Unchanged,
    Changed { from: Option<String>, to: Option<String> },
}

pub struct RouteController {
    table: Arc<dyn RouteTable>,
    config: RouteConfig,
    managed: HashSet<String>,
    /// Applied GatewayState.
    current: Option<String>,
    /// Primary default interface as last read from the table.
    observed: Option<String>,
    routes: Vec<RoutingEntry>,
    /// Managed interfaces that have been seen with a default route.
    known_gateways: HashSet<String>,
}

impl RouteController {
    pub fn new(table: Arc<dyn RouteTable>, config: RouteConfig, managed: impl IntoIterator<Item = String>) -> Self {
        Self {
            table,
            config,
            managed: managed.into_iter().collect(),
            current: None,
            observed: None,
            routes: Vec::new(),
            known_gateways: HashSet::new(),
        }
    }

    /// Interface the controller believes carries the default route.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Default routes as of the last read.
    pub fn routes(&self) -> &[RoutingEntry] {
        &self.routes
    }

    pub fn is_managed(&self, interface: &str) -> bool {
        self.managed.contains(interface)
    }

    /// Take over an existing default route as the applied state.
    pub fn adopt(&mut self, interface: &str) {
        tracing::info!(interface = %interface, "Adopting existing default route");
        self.current = Some(interface.to_string());
    }

    /// Forget the applied state without touching the table.
    pub fn release(&mut self) {
        if let Some(previous) = self.current.take() {
            tracing::info!(interface = %previous, "Default gateway released");
        }
    }

    /// Primary default interface as of the last read, managed or not.
    pub fn observed(&self) -> Option<&str> {
        self.observed.as_deref()
    }

    /// Re-read the table and report whether the primary default route moved
    /// since the previous read.
    pub async fn refresh(&mut self) -> Result<RouteChange, RouteError> {
        let before = self.observed.clone();
        self.read_table().await?;
        if before == self.observed {
            Ok(RouteChange::Unchanged)
        } else {
            Ok(RouteChange::Changed {
                from: before,
                to: self.observed.clone(),
            })
        }
    }

    /// Make `interface` the default route.
    pub async fn apply(&mut self, interface: &str) -> Result<ApplyOutcome, FailoverError> {
        let max_attempts = self.config.max_attempts.max(1);
        // Set once a promotion ran, even one that failed part way.
        let mut promoted = false;
        let mut partial = false;
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = calculate_backoff(attempt - 1, &self.config);
                tracing::info!(interface = %interface, attempt, delay = ?delay, reason = %last_error, "Retrying route apply");
                tokio::time::sleep(delay).await;
            }

            match self.read_table().await {
                Ok(()) if self.observed.as_deref() == Some(interface) => {
                    self.current = Some(interface.to_string());
                    if !promoted {
                        return Ok(ApplyOutcome::Unchanged);
                    }
                    if partial {
                        tracing::warn!(interface = %interface, "Default route moved by a promotion that reported failure");
                    }
                    return Ok(ApplyOutcome::Applied { attempts: attempt });
                }
                Ok(()) => {}
                Err(e) => {
                    last_error = e.to_string();
                    continue;
                }
            }

            match self.table.promote(interface).await {
                Ok(()) => promoted = true,
                Err(e @ RouteError::NoDefaultRoute(_)) => {
                    return Err(self.failed(interface, attempt, e.to_string()));
                }
                Err(e) => {
                    promoted = true;
                    partial = true;
                    tracing::warn!(interface = %interface, attempt, error = %e, "Route promotion failed");
                    last_error = e.to_string();
                    continue;
                }
            }

            match self.read_table().await {
                Ok(()) if self.observed.as_deref() == Some(interface) => {
                    self.current = Some(interface.to_string());
                    tracing::info!(interface = %interface, attempts = attempt, "Default gateway applied");
                    return Ok(ApplyOutcome::Applied { attempts: attempt });
                }
                Ok(()) => {
                    last_error = format!(
                        "routing table shows {} as default after promotion",
                        self.observed.as_deref().unwrap_or("nothing")
                    );
                    tracing::warn!(interface = %interface, attempt, reason = %last_error, "Route verification failed");
                }
                Err(e) => last_error = e.to_string(),
            }
        }

        Err(self.failed(interface, max_attempts, last_error))
    }

    fn failed(&self, interface: &str, attempts: u32, reason: String) -> FailoverError {
        tracing::error!(interface = %interface, attempts, reason = %reason, "Giving up on route apply");
        FailoverError::ApplyFailed {
            interface: interface.to_string(),
            attempts,
            reason,
        }
    }

    async fn read_table(&mut self) -> Result<(), RouteError> {
        let routes = self.table.default_routes().await?;
        self.observed = primary_route(&routes).map(|r| r.interface.clone());

        let present: HashSet<&str> = routes.iter().map(|r| r.interface.as_str()).collect();
        for name in &self.known_gateways {
            if !present.contains(name.as_str()) {
                tracing::warn!(interface = %name, "Missing expected default route");
            }
        }
        for name in present {
            if self.managed.contains(name) {
                self.known_gateways.insert(name.to_string());
            }
        }

        self.routes = routes;
        Ok(())
    }
}

//! In-memory routing table.
//!
//! Backs the `dry-run` route backend and the test suites. Promotion swaps
//! metrics exactly like the Linux backend, and every mutation is counted.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::InterfaceConfig;
use crate::error::RouteError;
use crate::route::table::{primary_route, RouteTable, RoutingEntry};

#[derive(Debug, Default)]
pub struct MemoryRouteTable {
    routes: Mutex<Vec<RoutingEntry>>,
    mutations: AtomicUsize,
    /// Promotions that fail outright.
    failing: AtomicU32,
    /// Promotions that report success without changing anything.
    ignored: AtomicU32,
    /// Promotions that switch the primary but lose the demoted route.
    lossy: AtomicU32,
}

impl MemoryRouteTable {
    pub fn new(routes: Vec<RoutingEntry>) -> Self {
        Self {
            routes: Mutex::new(routes),
            ..Self::default()
        }
    }

    /// One default route per interface, metrics ordered by configured priority.
    pub fn seeded(interfaces: &[InterfaceConfig]) -> Self {
        let mut sorted: Vec<&InterfaceConfig> = interfaces.iter().collect();
        sorted.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        let routes = sorted
            .into_iter()
            .enumerate()
            .map(|(idx, iface)| RoutingEntry::new(iface.name.clone(), Ipv4Addr::UNSPECIFIED, (idx as u32 + 1) * 100))
            .collect();
        Self::new(routes)
    }

    /// Number of promotions that changed the table.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Make the next `n` promotions fail with a command error.
    pub fn fail_next_promotions(&self, n: u32) {
        self.failing.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` promotions silently do nothing.
    pub fn ignore_next_promotions(&self, n: u32) {
        self.ignored.store(n, Ordering::SeqCst);
    }

    /// Make the next promotion switch the primary, drop the old primary's
    /// route and then report a command error.
    pub fn lose_demoted_on_next_promotion(&self) {
        self.lossy.store(1, Ordering::SeqCst);
    }

    /// Replace the table, as an external tool would.
    pub fn replace(&self, routes: Vec<RoutingEntry>) {
        *self.lock() = routes;
    }

    pub fn snapshot(&self) -> Vec<RoutingEntry> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RoutingEntry>> {
        self.routes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn take_one(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RouteTable for MemoryRouteTable {
    async fn default_routes(&self) -> Result<Vec<RoutingEntry>, RouteError> {
        Ok(self.snapshot())
    }

    async fn promote(&self, interface: &str) -> Result<(), RouteError> {
        if Self::take_one(&self.failing) {
            return Err(RouteError::Command {
                command: format!("promote {interface}"),
                stderr: "injected failure".to_string(),
            });
        }

        let mut routes = self.lock();
        let primary = primary_route(&routes)
            .map(|r| r.interface.clone())
            .ok_or_else(|| RouteError::NoDefaultRoute(interface.to_string()))?;
        if primary == interface {
            return Ok(());
        }
        let target_idx = routes
            .iter()
            .position(|r| r.interface == interface)
            .ok_or_else(|| RouteError::NoDefaultRoute(interface.to_string()))?;

        if Self::take_one(&self.ignored) {
            return Ok(());
        }

        let primary_idx = routes
            .iter()
            .position(|r| r.interface == primary)
            .ok_or_else(|| RouteError::NoDefaultRoute(primary.clone()))?;
        let target_metric = routes[target_idx].metric;
        routes[target_idx].metric = routes[primary_idx].metric;
        routes[primary_idx].metric = target_metric;

        self.mutations.fetch_add(1, Ordering::SeqCst);

        if Self::take_one(&self.lossy) {
            routes.remove(primary_idx);
            return Err(RouteError::Command {
                command: format!("ip route add default dev {primary}"),
                stderr: "injected failure".to_string(),
            });
        }

        tracing::info!(interface = %interface, previous = %primary, "Default route swapped (in-memory)");
        Ok(())
    }
}

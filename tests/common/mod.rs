//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use net_failover::config::{FailoverConfig, InterfaceConfig, ProbeKind};
use net_failover::coordinator::{Coordinator, CoordinatorHandle};
use net_failover::probe::{LinkMonitor, ProbeSample};
use net_failover::route::{MemoryRouteTable, RouteController};

/// Link monitor whose answers are set by the test.
#[derive(Default)]
pub struct ScriptedMonitor {
    reachable: Mutex<HashMap<String, bool>>,
}

impl ScriptedMonitor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, interface: &str, reachable: bool) {
        self.reachable
            .lock()
            .unwrap()
            .insert(interface.to_string(), reachable);
    }
}

#[async_trait]
impl LinkMonitor for ScriptedMonitor {
    async fn check(&self, interface: &InterfaceConfig) -> bool {
        self.reachable
            .lock()
            .unwrap()
            .get(&interface.name)
            .copied()
            .unwrap_or(false)
    }
}

/// Config managing `names` in priority order, tuned for fast tests.
pub fn config(names: &[&str]) -> FailoverConfig {
    let mut config = FailoverConfig::default();
    config.interfaces = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut iface = InterfaceConfig::new(*name, (i as u32 + 1) * 10);
            iface.probe = ProbeKind::Operstate;
            iface
        })
        .collect();
    config.probe.interval_ms = 20;
    config.probe.timeout_ms = 10;
    config.route.base_delay_ms = 1;
    config.route.max_delay_ms = 5;
    config.api.bind_address = "127.0.0.1:0".to_string();
    config.normalize();
    config
}

pub struct Harness {
    pub handle: CoordinatorHandle,
    pub table: Arc<MemoryRouteTable>,
    pub shutdown: broadcast::Sender<()>,
    pub task: JoinHandle<()>,
}

impl Harness {
    /// Coordinator over a routing table seeded in priority order.
    pub fn start(config: &FailoverConfig) -> Self {
        let table = Arc::new(MemoryRouteTable::seeded(&config.interfaces));
        Self::with_table(config, table)
    }

    pub fn with_table(config: &FailoverConfig, table: Arc<MemoryRouteTable>) -> Self {
        let controller = RouteController::new(
            table.clone(),
            config.route.clone(),
            config.interfaces.iter().map(|i| i.name.clone()),
        );
        let (coordinator, handle) = Coordinator::new(config, controller);
        let (shutdown, rx) = broadcast::channel(1);
        let task = tokio::spawn(coordinator.run(rx));
        Self {
            handle,
            table,
            shutdown,
            task,
        }
    }

    /// Deliver `times` identical samples.
    pub async fn feed(&self, interface: &str, reachable: bool, times: usize) {
        let samples = self.handle.sample_sender();
        for _ in 0..times {
            samples
                .send(ProbeSample::now(interface, reachable))
                .await
                .unwrap();
        }
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        self.task.await.unwrap();
    }
}

/// Poll `check` until it holds or `deadline` passes.
pub async fn eventually<F, Fut>(deadline: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

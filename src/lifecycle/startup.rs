//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the routing table backend, route controller and coordinator
//! - Spawn one probe task per managed interface
//! - Serve the control API until shutdown
//! - Drain every task before returning
//!
//! # Design Decisions
//! - The coordinator starts before probes so no sample is dropped
//! - The API listener is bound by the caller, which lets tests use port 0
//! - Monitors and the routing table are injectable for tests

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::net::TcpListener;

use crate::api;
use crate::config::FailoverConfig;
use crate::coordinator::Coordinator;
use crate::lifecycle::Shutdown;
use crate::probe::{self, LinkMonitor, ProbeRunner};
use crate::route::{self, RouteController, RouteTable};

pub struct Daemon {
    config: FailoverConfig,
    table: Arc<dyn RouteTable>,
    monitors: HashMap<String, Arc<dyn LinkMonitor>>,
}

impl Daemon {
    /// Wire the configured probe kinds and routing backend.
    pub fn from_config(config: FailoverConfig) -> Self {
        let table = route::table_for(config.route.backend, &config.interfaces);
        let monitors = config
            .interfaces
            .iter()
            .map(|i| (i.name.clone(), probe::monitor_for(i.probe, &config.probe)))
            .collect();
        Self {
            config,
            table,
            monitors,
        }
    }

    /// Use one monitor for every interface and a caller-provided table.
    pub fn with_parts(config: FailoverConfig, table: Arc<dyn RouteTable>, monitor: Arc<dyn LinkMonitor>) -> Self {
        let monitors = config
            .interfaces
            .iter()
            .map(|i| (i.name.clone(), monitor.clone()))
            .collect();
        Self {
            config,
            table,
            monitors,
        }
    }

    /// Run until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let Daemon {
            config,
            table,
            monitors,
        } = self;

        tracing::info!(
            interfaces = config.interfaces.len(),
            backend = ?config.route.backend,
            debounce = config.health.debounce_samples,
            "Starting failover daemon"
        );

        let controller = RouteController::new(
            table,
            config.route.clone(),
            config.interfaces.iter().map(|i| i.name.clone()),
        );
        let (coordinator, handle) = Coordinator::new(&config, controller);
        let coordinator_task = tokio::spawn(coordinator.run(shutdown.subscribe()));

        let mut probe_tasks = Vec::with_capacity(config.interfaces.len());
        for iface in &config.interfaces {
            let Some(monitor) = monitors.get(&iface.name) else {
                tracing::warn!(interface = %iface.name, "No monitor configured, interface will stay UNKNOWN");
                continue;
            };
            let runner = ProbeRunner::new(iface.clone(), monitor.clone(), &config.probe, handle.sample_sender());
            probe_tasks.push(tokio::spawn(runner.run(shutdown.subscribe())));
        }

        let router = api::router(handle, &config.api);
        let served = api::serve(listener, router, shutdown.subscribe()).await;
        if let Err(e) = &served {
            tracing::error!(error = %e, "Control API failed, stopping");
            shutdown.trigger();
        }

        join_all(probe_tasks).await;
        if let Err(e) = coordinator_task.await {
            tracing::error!(error = %e, "Coordinator task failed");
        }

        tracing::info!("Failover daemon stopped");
        served
    }
}

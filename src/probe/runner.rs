//! Periodic probing of one interface.
//!
//! # Responsibilities
//! - Sample one interface at a fixed interval
//! - Bound every sample by the probe timeout
//! - Forward samples to the coordinator

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};

use crate::config::{InterfaceConfig, ProbeConfig};
use crate::observability::metrics;
use crate::probe::{LinkMonitor, ProbeSample};

pub struct ProbeRunner {
    interface: InterfaceConfig,
    monitor: Arc<dyn LinkMonitor>,
    interval: Duration,
    timeout: Duration,
    samples: mpsc::Sender<ProbeSample>,
}

impl ProbeRunner {
    pub fn new(
        interface: InterfaceConfig,
        monitor: Arc<dyn LinkMonitor>,
        config: &ProbeConfig,
        samples: mpsc::Sender<ProbeSample>,
    ) -> Self {
        Self {
            interface,
            monitor,
            interval: config.interval(),
            timeout: config.timeout(),
            samples,
        }
    }

    /// Take one sample. A monitor that overruns the timeout counts as unreachable.
    pub async fn sample(&self) -> ProbeSample {
        let reachable = match time::timeout(self.timeout, self.monitor.check(&self.interface)).await {
            Ok(reachable) => reachable,
            Err(_) => {
                tracing::debug!(interface = %self.interface.name, timeout = ?self.timeout, "Probe timed out");
                false
            }
        };
        ProbeSample::now(self.interface.name.clone(), reachable)
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interface = %self.interface.name,
            interval = ?self.interval,
            timeout = ?self.timeout,
            targets = ?self.interface.targets,
            "Probe starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let sample = self.sample().await;
                    tracing::debug!(interface = %sample.interface, reachable = sample.reachable, "Probe sample");
                    metrics::record_probe_sample(&sample.interface, sample.reachable);

                    if self.samples.send(sample).await.is_err() {
                        tracing::info!(interface = %self.interface.name, "Sample channel closed, probe exiting");
                        break;
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!(interface = %self.interface.name, "Probe received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

//! ICMP reachability through a specific interface.
//!
//! Shells out to `ping -I <if>` and judges the summary line
//! (`4 packets transmitted, 4 received, 0% packet loss, time 503ms`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::config::{InterfaceConfig, ProbeConfig};
use crate::exec::{CommandRunner, SystemRunner};
use crate::probe::LinkMonitor;

/// Seconds between echo requests within one sample.
const PING_SPACING: &str = "0.5";

/// Ping-based monitor. A target is reachable when packet loss is at or below the threshold.
#[derive(Clone)]
pub struct PingMonitor {
    count: u32,
    /// Passed as `ping -w`; kept below the probe timeout.
    deadline: Duration,
    loss_threshold: u8,
    runner: Arc<dyn CommandRunner>,
}

impl PingMonitor {
    pub fn new(count: u32, deadline: Duration, loss_threshold: u8) -> Self {
        Self {
            count: count.max(1),
            deadline,
            loss_threshold,
            runner: Arc::new(SystemRunner),
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.ping_count, config.ping_deadline(), config.packet_loss_threshold)
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    fn args(&self, interface: &str, target: &str) -> Vec<String> {
        let count = self.count.to_string();
        let deadline_secs = self.deadline.as_secs().max(1).to_string();
        let args = [
            "-n", "-q",
            "-I", interface,
            "-c", count.as_str(),
            "-i", PING_SPACING,
            "-W", "1",
            "-w", deadline_secs.as_str(),
            target,
        ];
        args.iter().map(|a| a.to_string()).collect()
    }

    async fn ping(&self, interface: &str, target: &str) -> bool {
        let output = match self.runner.run("ping", &self.args(interface, target)).await {
            Ok(o) => o,
            Err(e) => {
                tracing::debug!(interface = %interface, target = %target, error = %e, "Failed to spawn ping");
                return false;
            }
        };

        match parse_packet_loss(&output.stdout) {
            Some(loss) => {
                tracing::debug!(interface = %interface, target = %target, loss, "Ping finished");
                if loss > f32::from(self.loss_threshold) {
                    tracing::debug!(
                        interface = %interface,
                        target = %target,
                        loss,
                        threshold = self.loss_threshold,
                        "Packet loss above threshold"
                    );
                    false
                } else {
                    true
                }
            }
            None => {
                tracing::debug!(interface = %interface, target = %target, "No packet loss summary in ping output");
                false
            }
        }
    }
}

#[async_trait]
impl LinkMonitor for PingMonitor {
    async fn check(&self, interface: &InterfaceConfig) -> bool {
        let results = join_all(
            interface
                .targets
                .iter()
                .map(|target| self.ping(&interface.name, target)),
        )
        .await;
        results.into_iter().any(|ok| ok)
    }
}

/// Extract the packet loss percentage from ping output.
pub fn parse_packet_loss(output: &str) -> Option<f32> {
    let line = output.lines().find(|l| l.contains("packet loss"))?;
    line.split(',')
        .find_map(|field| field.trim().strip_suffix("% packet loss"))
        .and_then(|value| value.trim().parse::<f32>().ok())
}

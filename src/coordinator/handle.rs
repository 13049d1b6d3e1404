//! Client side of the coordinator.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time;

use crate::coordinator::command::Command;
use crate::coordinator::state::{InterfaceStatus, Phase};
use crate::error::FailoverError;
use crate::probe::ProbeSample;
use crate::route::RoutingEntry;
use crate::selector::OverrideRequest;

/// Cheap to clone; every clone talks to the same coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    samples: mpsc::Sender<ProbeSample>,
    force_timeout: Duration,
}

impl CoordinatorHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        samples: mpsc::Sender<ProbeSample>,
        force_timeout: Duration,
    ) -> Self {
        Self {
            commands,
            samples,
            force_timeout,
        }
    }

    /// Sender probes use to deliver samples.
    pub fn sample_sender(&self) -> mpsc::Sender<ProbeSample> {
        self.samples.clone()
    }

    /// GetDefaultGw: the applied gateway, `None` while unset.
    pub async fn default_gateway(&self) -> Result<Option<String>, FailoverError> {
        self.request(|reply| Command::GetDefaultGw { reply }).await
    }

    /// GetIfStatus: health of every managed interface, in priority order.
    pub async fn interface_status(&self) -> Result<Vec<InterfaceStatus>, FailoverError> {
        self.request(|reply| Command::GetIfStatus { reply }).await
    }

    pub async fn phase(&self) -> Result<Phase, FailoverError> {
        self.request(|reply| Command::GetPhase { reply }).await
    }

    /// Default routes as last read by the route controller.
    pub async fn routes(&self) -> Result<Vec<RoutingEntry>, FailoverError> {
        self.request(|reply| Command::GetRoutes { reply }).await
    }

    /// ForceNewGateway: blocks until the override is accepted or rejected,
    /// or until the force timeout elapses.
    pub async fn force_gateway(&self, interface: &str) -> Result<(), FailoverError> {
        let request = OverrideRequest::new(interface);
        let pending = self.request(|reply| Command::ForceNewGateway { request, reply });

        match time::timeout(self.force_timeout, pending).await {
            Ok(outcome) => outcome.and_then(|result| result),
            Err(_) => {
                tracing::warn!(interface = %interface, timeout = ?self.force_timeout, "Override timed out");
                Err(FailoverError::Timeout(self.force_timeout))
            }
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, FailoverError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| FailoverError::CoordinatorStopped)?;
        rx.await.map_err(|_| FailoverError::CoordinatorStopped)
    }
}

//! Failover coordinator.
//!
//! # Responsibilities
//! - Own every interface's health evaluator and the route controller
//! - Serialize probe samples, operator commands and routing table resyncs
//! - Run the gateway selector after every health transition or override
//! - Track the control loop phase
//!
//! # Data Flow
//! ```text
//! ProbeRunner ──samples──┐
//! CoordinatorHandle ─────┼──▶ Coordinator::run (one task, biased select)
//! resync ticker ─────────┘        │
//!                                 ├─ HealthEvaluator::observe → transition?
//!                                 ├─ selector::select → Decision
//!                                 └─ RouteController::apply → GatewayState
//! ```
//!
//! # Design Decisions
//! - A single task owns all mutable state; queries never observe a
//!   half-applied decision
//! - Shutdown is checked first, then samples, then commands, so an override
//!   is always judged against the freshest health
//! - An override whose caller already gave up is dropped unevaluated

pub mod command;
pub mod handle;
pub mod state;

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::{FailoverConfig, InterfaceConfig};
use crate::error::FailoverError;
use crate::health::{HealthEvaluator, HealthState};
use crate::observability::metrics;
use crate::probe::ProbeSample;
use crate::route::{ApplyOutcome, RouteChange, RouteController};
use crate::selector::{self, Decision, OverrideRequest, SwitchReason};

pub use command::Command;
pub use handle::CoordinatorHandle;
pub use state::{InterfaceStatus, Phase};

const COMMAND_CHANNEL_CAPACITY: usize = 64;
const SAMPLE_CHANNEL_CAPACITY: usize = 1024;

pub struct Coordinator {
    /// Managed interfaces, ordered by priority then name.
    interfaces: Vec<InterfaceConfig>,
    priorities: HashMap<String, u32>,
    evaluators: HashMap<String, HealthEvaluator>,
    controller: RouteController,
    phase: Phase,
    resync_interval: Duration,
    samples: mpsc::Receiver<ProbeSample>,
    commands: mpsc::Receiver<Command>,
}

impl Coordinator {
    /// Build the coordinator and the handle used to reach it.
    pub fn new(config: &FailoverConfig, controller: RouteController) -> (Self, CoordinatorHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (sample_tx, sample_rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);

        let mut interfaces = config.interfaces.clone();
        interfaces.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));

        let priorities = interfaces
            .iter()
            .map(|i| (i.name.clone(), i.priority))
            .collect();
        let evaluators = interfaces
            .iter()
            .map(|i| {
                (
                    i.name.clone(),
                    HealthEvaluator::new(i.name.clone(), config.health.debounce_samples),
                )
            })
            .collect();

        let coordinator = Self {
            interfaces,
            priorities,
            evaluators,
            controller,
            phase: Phase::Initializing,
            resync_interval: Duration::from_secs(config.route.resync_interval_secs.max(1)),
            samples: sample_rx,
            commands: command_rx,
        };
        let handle = CoordinatorHandle::new(command_tx, sample_tx, config.api.force_timeout());

        (coordinator, handle)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run until shutdown fires or every handle is dropped.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interfaces = self.interfaces.len(), "Coordinator starting");
        metrics::set_degraded(false);
        for iface in &self.interfaces {
            metrics::record_health(&iface.name, HealthState::Unknown);
        }

        self.adopt_existing_route().await;

        let mut resync = time::interval_at(Instant::now() + self.resync_interval, self.resync_interval);
        resync.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    tracing::info!("Coordinator received shutdown signal");
                    break;
                }
                Some(sample) = self.samples.recv() => self.on_sample(sample).await,
                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    None => {
                        tracing::info!("All coordinator handles dropped");
                        break;
                    }
                },
                _ = resync.tick() => self.on_resync().await,
            }
        }

        tracing::info!(phase = %self.phase, gateway = ?self.controller.current(), "Coordinator stopped");
    }

    async fn adopt_existing_route(&mut self) {
        if let Err(e) = self.controller.refresh().await {
            tracing::warn!(error = %e, "Failed to read routing table at startup");
            return;
        }
        match self.controller.observed().map(str::to_string) {
            Some(primary) if self.controller.is_managed(&primary) => self.controller.adopt(&primary),
            Some(primary) => {
                tracing::info!(interface = %primary, "Default route is on an unmanaged interface")
            }
            None => tracing::info!("No default route present at startup"),
        }
    }

    async fn on_sample(&mut self, sample: ProbeSample) {
        let Some(evaluator) = self.evaluators.get_mut(&sample.interface) else {
            tracing::warn!(interface = %sample.interface, "Dropping sample for unmanaged interface");
            return;
        };

        let Some(transition) = evaluator.observe(&sample) else {
            return;
        };

        tracing::info!(
            interface = %transition.interface,
            from = %transition.from,
            to = %transition.to,
            "Interface health changed"
        );
        metrics::record_health(&transition.interface, transition.to);

        // Apply failures are already logged and reflected in the phase.
        let _ = self.evaluate(None).await;
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::GetDefaultGw { reply } => {
                let _ = reply.send(self.controller.current().map(str::to_string));
            }
            Command::GetIfStatus { reply } => {
                let _ = reply.send(self.status_snapshot());
            }
            Command::ForceNewGateway { request, reply } => {
                if reply.is_closed() {
                    tracing::warn!(
                        interface = %request.interface,
                        waited = ?request.requested_at.elapsed(),
                        "Discarding override abandoned by its caller"
                    );
                    return;
                }

                tracing::info!(interface = %request.interface, "Override requested");
                let result = self.evaluate(Some(request)).await;
                match &result {
                    Ok(()) => tracing::info!("Override accepted"),
                    Err(e) => tracing::warn!(error = %e, "Override rejected"),
                }
                let _ = reply.send(result);
            }
            Command::GetPhase { reply } => {
                let _ = reply.send(self.phase);
            }
            Command::GetRoutes { reply } => {
                let _ = reply.send(self.controller.routes().to_vec());
            }
        }
    }

    async fn on_resync(&mut self) {
        match self.controller.refresh().await {
            Ok(RouteChange::Changed { from, to }) => {
                tracing::warn!(from = ?from, to = ?to, "Default route changed outside the control plane");
                match to {
                    Some(primary) if self.controller.is_managed(&primary) => self.controller.adopt(&primary),
                    _ => self.controller.release(),
                }
                let _ = self.evaluate(None).await;
            }
            Ok(RouteChange::Unchanged) => {
                if self.phase == Phase::Degraded {
                    let _ = self.evaluate(None).await;
                }
            }
            Err(e) => tracing::warn!(error = %e, "Routing table resync failed"),
        }
    }

    /// One selection round followed by applying its decision.
    async fn evaluate(&mut self, override_request: Option<OverrideRequest>) -> Result<(), FailoverError> {
        let health = self.health_map();

        if override_request.is_none() && self.phase == Phase::Initializing {
            if let Some(gateway) = self.controller.current() {
                if health.get(gateway).copied().unwrap_or_default() == HealthState::Unknown {
                    tracing::debug!(interface = %gateway, "Awaiting first verdict on adopted gateway");
                    return Ok(());
                }
            }
        }

        let decision = selector::select(
            self.controller.current(),
            &health,
            &self.priorities,
            override_request.as_ref(),
        )?;

        match decision {
            Decision::NoChange => {
                self.set_phase(Phase::Steady);
                Ok(())
            }
            Decision::Switch { interface, reason } => {
                let reason = if reason == SwitchReason::AutoFailover && self.phase == Phase::Initializing {
                    SwitchReason::Startup
                } else {
                    reason
                };
                self.switch_to(&interface, reason).await
            }
            Decision::NoViableInterface => {
                self.controller.release();
                let pending = health.values().any(|h| *h == HealthState::Unknown);
                if pending && self.phase == Phase::Initializing {
                    tracing::debug!("No interface is UP yet, still waiting on first verdicts");
                } else {
                    self.set_phase(Phase::Degraded);
                }
                Ok(())
            }
        }
    }

    async fn switch_to(&mut self, interface: &str, reason: SwitchReason) -> Result<(), FailoverError> {
        tracing::info!(
            from = ?self.controller.current(),
            to = %interface,
            reason = %reason,
            "Switching default gateway"
        );

        match self.controller.apply(interface).await {
            Ok(ApplyOutcome::Applied { attempts }) => {
                metrics::record_switch(interface, reason);
                tracing::debug!(interface = %interface, attempts, "Switch complete");
                self.set_phase(Phase::Steady);
                Ok(())
            }
            Ok(ApplyOutcome::Unchanged) => {
                tracing::info!(interface = %interface, "Interface already carries the default route");
                self.set_phase(Phase::Steady);
                Ok(())
            }
            Err(e) => {
                metrics::record_apply_failure(interface);
                if reason != SwitchReason::ManualOverride {
                    self.set_phase(Phase::Degraded);
                }
                Err(e)
            }
        }
    }

    fn set_phase(&mut self, next: Phase) {
        if next == self.phase {
            return;
        }
        if next == Phase::Degraded {
            tracing::warn!(from = %self.phase, gateway = ?self.controller.current(), "Entering degraded phase");
        } else {
            tracing::info!(from = %self.phase, to = %next, "Coordinator phase changed");
        }
        metrics::set_degraded(next == Phase::Degraded);
        self.phase = next;
    }

    fn health_map(&self) -> HashMap<String, HealthState> {
        self.evaluators
            .iter()
            .map(|(name, evaluator)| (name.clone(), evaluator.state()))
            .collect()
    }

    fn status_snapshot(&self) -> Vec<InterfaceStatus> {
        self.interfaces
            .iter()
            .map(|iface| {
                let evaluator = self.evaluators.get(&iface.name);
                InterfaceStatus {
                    name: iface.name.clone(),
                    priority: iface.priority,
                    health: evaluator.map(|e| e.state()).unwrap_or_default(),
                    last_checked_at: evaluator.and_then(|e| e.last_checked_at()),
                }
            })
            .collect()
    }
}

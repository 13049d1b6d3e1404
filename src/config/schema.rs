//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the failover
//! daemon. All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the failover daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FailoverConfig {
    /// Managed interfaces. Fixed for the lifetime of the process.
    pub interfaces: Vec<InterfaceConfig>,

    /// Probe timing and defaults.
    pub probe: ProbeConfig,

    /// Debounce settings.
    pub health: HealthConfig,

    /// Routing table backend and apply retries.
    pub route: RouteConfig,

    /// Control API listener.
    pub api: ApiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl FailoverConfig {
    /// Fill per-interface gaps from the global probe section.
    ///
    /// Interfaces without explicit targets inherit `probe.default_targets`.
    pub fn normalize(&mut self) {
        for iface in &mut self.interfaces {
            if iface.targets.is_empty() {
                iface.targets = self.probe.default_targets.clone();
            }
        }
    }

    /// Look up an interface by name.
    pub fn interface(&self, name: &str) -> Option<&InterfaceConfig> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

/// A managed network interface.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct InterfaceConfig {
    /// Kernel interface name (e.g. "eth0").
    pub name: String,

    /// Preference rank, lower = preferred.
    #[serde(default)]
    pub priority: u32,

    /// Hosts probed through this interface.
    #[serde(default)]
    pub targets: Vec<String>,

    /// How reachability is sampled.
    #[serde(default)]
    pub probe: ProbeKind,
}

impl InterfaceConfig {
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
            targets: Vec::new(),
            probe: ProbeKind::default(),
        }
    }
}

/// Probe implementation used for an interface.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// ICMP echo through the interface, judged by packet loss.
    #[default]
    Ping,
    /// Kernel link state from sysfs.
    Operstate,
}

/// Spacing between echo requests within one ping sample (`-i 0.5`).
pub const PING_SPACING_MS: u64 = 500;

/// How long ping waits for the last reply (`-W 1`), in milliseconds.
pub const PING_REPLY_WAIT_MS: u64 = 1_000;

/// Gap kept between ping's own deadline and the probe timeout.
const PING_DEADLINE_MARGIN_MS: u64 = 500;

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Sampling interval in milliseconds.
    pub interval_ms: u64,

    /// Per-sample timeout in milliseconds. Must be below `interval_ms`.
    pub timeout_ms: u64,

    /// Targets for interfaces that do not list their own.
    pub default_targets: Vec<String>,

    /// Echo requests sent per sample.
    pub ping_count: u32,

    /// Packet loss percentage above which a target counts as unreachable.
    pub packet_loss_threshold: u8,
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Deadline handed to `ping -w`: whole seconds, at least half a second
    /// short of the probe timeout so ping reports before it is cut off.
    pub fn ping_deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_ms.saturating_sub(PING_DEADLINE_MARGIN_MS) / 1_000)
    }

    /// Smallest `timeout_ms` whose ping deadline still covers every echo
    /// request plus the wait for the last reply.
    pub fn min_ping_timeout_ms(&self) -> u64 {
        let echoes = u64::from(self.ping_count.max(1) - 1) * PING_SPACING_MS + PING_REPLY_WAIT_MS;
        echoes.div_ceil(1_000) * 1_000 + PING_DEADLINE_MARGIN_MS
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            timeout_ms: 3_000,
            default_targets: vec!["8.8.8.8".to_string()],
            ping_count: 3,
            packet_loss_threshold: 25,
        }
    }
}

/// Health evaluation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Consecutive same-valued samples required to change a verdict.
    pub debounce_samples: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { debounce_samples: 3 }
    }
}

/// Which routing table the controller drives.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RouteBackend {
    /// `/proc/net/route` + `ip route`.
    #[default]
    Linux,
    /// In-memory table seeded from the interface list. Nothing touches the host.
    DryRun,
}

/// Route controller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteConfig {
    pub backend: RouteBackend,

    /// Maximum apply attempts per decision.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// How often the routing table is re-read to spot external changes.
    pub resync_interval_secs: u64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            backend: RouteBackend::Linux,
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
            resync_interval_secs: 5,
        }
    }
}

/// Control API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address (e.g., "127.0.0.1:50051").
    pub bind_address: String,

    /// Upper bound on how long a ForceNewGateway call may block.
    pub force_timeout_secs: u64,

    /// Overall HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    pub fn force_timeout(&self) -> Duration {
        Duration::from_secs(self.force_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:50051".to_string(),
            force_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `failover_interface_health` (gauge): 1=UP, 0=DOWN, -1=UNKNOWN per interface
//! - `failover_probe_samples_total` (counter): samples by interface and result
//! - `failover_gateway_switches_total` (counter): applied switches by interface and reason
//! - `failover_route_apply_failures_total` (counter): decisions abandoned after retries
//! - `failover_degraded` (gauge): 1 while no interface is viable
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::health::HealthState;
use crate::selector::SwitchReason;

/// Initialize the Prometheus metrics exporter.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe_sample(interface: &str, reachable: bool) {
    let result = if reachable { "reachable" } else { "unreachable" };
    ::metrics::counter!(
        "failover_probe_samples_total",
        "interface" => interface.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_health(interface: &str, state: HealthState) {
    ::metrics::gauge!("failover_interface_health", "interface" => interface.to_string())
        .set(state.as_gauge());
}

pub fn record_switch(interface: &str, reason: SwitchReason) {
    ::metrics::counter!(
        "failover_gateway_switches_total",
        "interface" => interface.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

pub fn record_apply_failure(interface: &str) {
    ::metrics::counter!("failover_route_apply_failures_total", "interface" => interface.to_string())
        .increment(1);
}

pub fn set_degraded(degraded: bool) {
    ::metrics::gauge!("failover_degraded").set(if degraded { 1.0 } else { 0.0 });
}

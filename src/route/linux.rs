//! Linux routing table backend.
//!
//! # Responsibilities
//! - Read default routes from `/proc/net/route`
//! - Promote an interface by swapping its default route metric with the
//!   current primary's, using `ip route`
//!
//! # Design Decisions
//! - Swapping metrics keeps every interface's default route installed, so
//!   the kernel still has fallbacks while the control plane is busy
//! - Both old routes are deleted before re-adding; `ip route add` refuses
//!   a second default route with an already used metric
//! - The demoted route gets a metric no other default route holds, so equal
//!   metrics before the swap cannot make the re-add collide
//! - A failed second delete puts the first route back before returning

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RouteError;
use crate::exec::{CommandRunner, SystemRunner};
use crate::route::table::{primary_route, RouteTable, RoutingEntry};

const PROC_NET_ROUTE: &str = "/proc/net/route";

// Column offsets in /proc/net/route.
const IFACE_COL: usize = 0;
const DST_COL: usize = 1;
const GW_COL: usize = 2;
const METRIC_COL: usize = 6;
const MASK_COL: usize = 7;

#[derive(Clone)]
pub struct LinuxRouteTable {
    proc_path: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl LinuxRouteTable {
    pub fn new() -> Self {
        Self::with_parts(PROC_NET_ROUTE, Arc::new(SystemRunner))
    }

    /// Read routes from `proc_path` and run `ip` through `runner`.
    pub fn with_parts(proc_path: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            proc_path: proc_path.into(),
            runner,
        }
    }

    async fn ip(&self, action: &str, entry: &RoutingEntry) -> Result<(), RouteError> {
        let args = route_args(action, entry);
        let command = format!("ip {}", args.join(" "));
        tracing::info!(command = %command, "Reprogramming route");

        let output = self.runner.run("ip", &args).await?;
        if output.success {
            Ok(())
        } else {
            Err(RouteError::Command {
                command,
                stderr: output.stderr,
            })
        }
    }
}

/// Metric for the route being demoted: the promoted route's old metric,
/// unless that is taken, then the next free one above the new primary.
fn demoted_metric(routes: &[RoutingEntry], primary: &RoutingEntry, target: &RoutingEntry) -> u32 {
    let taken = |metric: u32| {
        metric == primary.metric
            || routes
                .iter()
                .any(|r| r.metric == metric && r.interface != primary.interface && r.interface != target.interface)
    };
    let mut metric = target.metric;
    while taken(metric) {
        metric = metric.saturating_add(1);
    }
    metric
}

impl Default for LinuxRouteTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RouteTable for LinuxRouteTable {
    async fn default_routes(&self) -> Result<Vec<RoutingEntry>, RouteError> {
        let content = tokio::fs::read_to_string(&self.proc_path).await?;
        parse_proc_net_route(&content)
    }

    async fn promote(&self, interface: &str) -> Result<(), RouteError> {
        let routes = self.default_routes().await?;
        let Some(primary) = primary_route(&routes).cloned() else {
            return Err(RouteError::NoDefaultRoute(interface.to_string()));
        };
        if primary.interface == interface {
            return Ok(());
        }
        let target = routes
            .iter()
            .find(|r| r.interface == interface)
            .cloned()
            .ok_or_else(|| RouteError::NoDefaultRoute(interface.to_string()))?;

        let demoted = RoutingEntry {
            metric: demoted_metric(&routes, &primary, &target),
            ..primary.clone()
        };
        let promoted = RoutingEntry { metric: primary.metric, ..target.clone() };

        self.ip("del", &target).await?;
        if let Err(e) = self.ip("del", &primary).await {
            if let Err(restore) = self.ip("add", &target).await {
                tracing::error!(route = %target, error = %restore, "Failed to restore route after aborted swap");
            }
            return Err(e);
        }

        // Try both adds regardless of the first one's outcome.
        let add_promoted = self.ip("add", &promoted).await;
        let add_demoted = self.ip("add", &demoted).await;
        add_promoted?;
        if let Err(e) = add_demoted {
            tracing::error!(route = %demoted, error = %e, "Promoted route installed but the previous primary was lost");
            return Err(e);
        }

        tracing::info!(interface = %interface, previous = %primary.interface, "Default route swapped");
        Ok(())
    }
}

/// Build `ip route` arguments for a default route.
fn route_args(action: &str, entry: &RoutingEntry) -> Vec<String> {
    let mut args = vec!["route".to_string(), action.to_string(), "default".to_string()];
    if !entry.gateway.is_unspecified() {
        args.push("via".to_string());
        args.push(entry.gateway.to_string());
    }
    args.push("dev".to_string());
    args.push(entry.interface.clone());
    args.push("metric".to_string());
    args.push(entry.metric.to_string());
    args
}

/// Addresses in /proc/net/route are hex dumps of network-order words.
fn parse_hex_addr(field: &str) -> Option<Ipv4Addr> {
    u32::from_str_radix(field, 16)
        .ok()
        .map(|raw| Ipv4Addr::from(raw.to_le_bytes()))
}

/// Extract default routes from the contents of `/proc/net/route`.
pub fn parse_proc_net_route(content: &str) -> Result<Vec<RoutingEntry>, RouteError> {
    let mut routes = Vec::new();

    // First line is the header.
    for (idx, line) in content.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() <= MASK_COL {
            return Err(RouteError::Parse {
                line: line_no,
                reason: format!("expected at least {} columns, found {}", MASK_COL + 1, fields.len()),
            });
        }

        let bad = |what: &str| RouteError::Parse {
            line: line_no,
            reason: format!("invalid {what}"),
        };
        let dst = parse_hex_addr(fields[DST_COL]).ok_or_else(|| bad("destination"))?;
        let mask = parse_hex_addr(fields[MASK_COL]).ok_or_else(|| bad("mask"))?;
        if !dst.is_unspecified() || !mask.is_unspecified() {
            continue;
        }
        let gateway = parse_hex_addr(fields[GW_COL]).ok_or_else(|| bad("gateway"))?;
        let metric = fields[METRIC_COL].parse::<u32>().map_err(|_| bad("metric"))?;

        routes.push(RoutingEntry::new(fields[IFACE_COL], gateway, metric));
    }

    Ok(routes)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::exec::testing::ScriptedRunner;
    use crate::exec::CommandOutput;

    const SAMPLE: &str = "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT\n\
eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0\n\
usb0\t00000000\t012AA8C0\t0003\t0\t0\t200\t00000000\t0\t0\t0\n\
eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0\n\
usb0\t002AA8C0\t00000000\t0001\t0\t0\t200\t00FFFFFF\t0\t0\t0\n";

    #[test]
    fn test_parses_default_routes_only() {
        let routes = parse_proc_net_route(SAMPLE).unwrap();
        assert_eq!(
            routes,
            vec![
                RoutingEntry::new("eth0", Ipv4Addr::new(192, 168, 1, 1), 100),
                RoutingEntry::new("usb0", Ipv4Addr::new(192, 168, 42, 1), 200),
            ]
        );
        assert_eq!(primary_route(&routes).unwrap().interface, "eth0");
    }

    #[test]
    fn test_header_only_table() {
        let routes = parse_proc_net_route("Iface\tDestination\tGateway\n").unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_truncated_line_is_an_error() {
        let err = parse_proc_net_route("header\neth0\t00000000\t0101A8C0\n").unwrap_err();
        assert!(matches!(err, RouteError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_route_args_without_gateway() {
        let entry = RoutingEntry::new("ppp0", Ipv4Addr::UNSPECIFIED, 50);
        assert_eq!(route_args("add", &entry).join(" "), "route add default dev ppp0 metric 50");

        let entry = RoutingEntry::new("eth0", Ipv4Addr::new(192, 168, 1, 1), 100);
        assert_eq!(
            route_args("del", &entry).join(" "),
            "route del default via 192.168.1.1 dev eth0 metric 100"
        );
    }

    fn table_with(content: &str, runner: Arc<ScriptedRunner>) -> (tempfile::NamedTempFile, LinuxRouteTable) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let table = LinuxRouteTable::with_parts(file.path(), runner);
        (file, table)
    }

    #[tokio::test]
    async fn test_promote_swaps_metrics_with_primary() {
        let runner = Arc::new(ScriptedRunner::succeeding());
        let (_file, table) = table_with(SAMPLE, runner.clone());

        table.promote("usb0").await.unwrap();
        assert_eq!(
            runner.calls(),
            vec![
                "ip route del default via 192.168.42.1 dev usb0 metric 200",
                "ip route del default via 192.168.1.1 dev eth0 metric 100",
                "ip route add default via 192.168.42.1 dev usb0 metric 100",
                "ip route add default via 192.168.1.1 dev eth0 metric 200",
            ]
        );
    }

    #[tokio::test]
    async fn test_promote_restores_route_when_primary_delete_fails() {
        let runner = Arc::new(ScriptedRunner::succeeding());
        runner.push_reply(CommandOutput::ok(""));
        runner.push_reply(CommandOutput::failed("RTNETLINK answers: No such process"));
        let (_file, table) = table_with(SAMPLE, runner.clone());

        let err = table.promote("usb0").await.unwrap_err();
        assert!(matches!(err, RouteError::Command { ref stderr, .. } if stderr.contains("No such process")));
        assert_eq!(
            runner.calls(),
            vec![
                "ip route del default via 192.168.42.1 dev usb0 metric 200",
                "ip route del default via 192.168.1.1 dev eth0 metric 100",
                "ip route add default via 192.168.42.1 dev usb0 metric 200",
            ]
        );
    }

    #[tokio::test]
    async fn test_equal_metrics_give_demoted_route_a_free_metric() {
        let runner = Arc::new(ScriptedRunner::succeeding());
        let (_file, table) = table_with(&SAMPLE.replace("\t200\t", "\t100\t"), runner.clone());

        table.promote("usb0").await.unwrap();
        let calls = runner.calls();
        assert_eq!(calls[2], "ip route add default via 192.168.42.1 dev usb0 metric 100");
        assert_eq!(calls[3], "ip route add default via 192.168.1.1 dev eth0 metric 101");
    }

    #[test]
    fn test_demoted_metric_skips_metrics_in_use() {
        let routes = vec![
            RoutingEntry::new("eth0", Ipv4Addr::UNSPECIFIED, 100),
            RoutingEntry::new("usb0", Ipv4Addr::UNSPECIFIED, 100),
            RoutingEntry::new("wwan0", Ipv4Addr::UNSPECIFIED, 101),
        ];
        assert_eq!(demoted_metric(&routes, &routes[0], &routes[1]), 102);
        assert_eq!(demoted_metric(&routes, &routes[0], &routes[2]), 101);
    }

    #[tokio::test]
    async fn test_promote_attempts_both_adds() {
        let runner = Arc::new(ScriptedRunner::new(|line| {
            if line.starts_with("ip route add") && line.contains("dev eth0") {
                CommandOutput::failed("RTNETLINK answers: File exists")
            } else {
                CommandOutput::ok("")
            }
        }));
        let (_file, table) = table_with(SAMPLE, runner.clone());

        let err = table.promote("usb0").await.unwrap_err();
        assert!(matches!(err, RouteError::Command { ref command, .. } if command.contains("dev eth0 metric 200")));
        assert_eq!(runner.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_promote_current_primary_runs_nothing() {
        let runner = Arc::new(ScriptedRunner::succeeding());
        let (_file, table) = table_with(SAMPLE, runner.clone());

        table.promote("eth0").await.unwrap();
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_promote_without_route_fails() {
        let runner = Arc::new(ScriptedRunner::succeeding());
        let (_file, table) = table_with(SAMPLE, runner.clone());

        let err = table.promote("wwan0").await.unwrap_err();
        assert!(matches!(err, RouteError::NoDefaultRoute(ref name) if name == "wwan0"));
        assert!(runner.calls().is_empty());
    }
}

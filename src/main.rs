//! Network failover daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐  samples   ┌──────────────────────────────────────┐
//!   │ probe/runner │──────────▶│             coordinator              │
//!   │ (per iface)  │            │  health evaluators → selector        │
//!   └──────────────┘            │          → route controller          │
//!                               └───────┬───────────────────┬──────────┘
//!   ┌──────────────┐  commands          │                   │
//!   │  api (axum)  │────────────────────┘                   ▼
//!   └──────────────┘                               /proc/net/route, `ip route`
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use net_failover::config::{load_config, RouteBackend};
use net_failover::lifecycle::{wait_for_signal, Daemon, Shutdown};
use net_failover::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "net-failover")]
#[command(about = "Keeps the default route on a healthy uplink", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "/etc/net-failover/config.toml")]
    config: PathBuf,

    /// Keep routing decisions in memory instead of touching the kernel table
    #[arg(long)]
    dry_run: bool,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(level) = args.log_level {
        config.observability.log_level = level;
    }
    if args.dry_run {
        config.route.backend = RouteBackend::DryRun;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), config = %args.config.display(), "net-failover starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.api.bind_address).await?;
    let shutdown = Shutdown::new();
    let daemon = Daemon::from_config(config);

    let run = daemon.run(listener, &shutdown);
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => result?,
        _ = wait_for_signal() => {
            shutdown.trigger();
            run.await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

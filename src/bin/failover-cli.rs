use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "failover-cli")]
#[command(about = "Control client for the net-failover daemon", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:50051")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the interface carrying the default route
    DefaultGw,
    /// List interface health
    Status,
    /// Force an interface to become the default gateway
    Force {
        /// Interface name, e.g. eth0
        interface: String,
    },
    /// Show default routes as seen by the daemon
    Routes,
    /// Show daemon version and phase
    Info,
    /// Poll the default gateway and report every change
    Watch {
        /// Poll interval in seconds
        #[arg(short, long, default_value_t = 5)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::DefaultGw => {
            let res = client.get(format!("{}/api/v1/default_gw", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Status => {
            let res = client.get(format!("{}/api/v1/if_status", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Force { interface } => {
            let res = client
                .post(format!("{}/api/v1/force_gateway", cli.url))
                .json(&json!({ "if_name": interface }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Routes => {
            let res = client.get(format!("{}/api/v1/routes", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Info => {
            let res = client.get(format!("{}/api/v1/status", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Watch { interval } => watch(&client, &cli.url, Duration::from_secs(interval.max(1))).await?,
    }

    Ok(())
}

async fn watch(client: &reqwest::Client, url: &str, interval: Duration) -> Result<(), Box<dyn std::error::Error>> {
    let mut last: Option<String> = None;
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        let current = match client.get(format!("{url}/api/v1/default_gw")).send().await {
            Ok(res) => match res.json::<Value>().await {
                Ok(body) => body["default_gw_interface"].as_str().unwrap_or_default().to_string(),
                Err(e) => {
                    eprintln!("Error: unreadable response: {e}");
                    continue;
                }
            },
            Err(e) => {
                eprintln!("Error: {e}");
                continue;
            }
        };

        if last.as_deref() != Some(current.as_str()) {
            let shown = if current.is_empty() { "<none>" } else { current.as_str() };
            match &last {
                Some(previous) if !previous.is_empty() => println!("default gateway: {previous} -> {shown}"),
                _ => println!("default gateway: {shown}"),
            }
            last = Some(current);
        }
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: daemon returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

//! # mf-host
//!
//! Headless microfrontend host. Loads a TOML host configuration, starts the
//! registry loops and the navigation shell, and runs until Ctrl-C.
//!
//! ```text
//! mf-host --config host.toml
//! mf-host --config host.toml --navigate /shop/cart --print-metrics
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use host_runtime::{HostConfig, HostPorts, MicrofrontendHost};
use mf_telemetry::{init_telemetry, TelemetryConfig};

#[derive(Debug, Parser)]
#[command(name = "mf-host", version, about = "Microfrontend runtime host")]
struct Cli {
    /// Host configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the initial path from the configuration.
    #[arg(long)]
    navigate: Option<String>,

    /// Print Prometheus metrics on shutdown.
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    let mut config = match &cli.config {
        Some(path) => HostConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => HostConfig::default(),
    };
    if let Some(path) = cli.navigate {
        config.initial_path = path;
    }

    let host = MicrofrontendHost::start(config, HostPorts::default())
        .await
        .context("Failed to start host")?;

    let state = host.shell().state();
    info!(
        path = ?state.current_path(),
        "Host is running. Press Ctrl+C to stop."
    );
    tokio::signal::ctrl_c().await?;

    host.refresh_metrics();
    host.shutdown();

    if cli.print_metrics {
        println!("{}", mf_telemetry::gather_metrics()?);
    }
    Ok(())
}

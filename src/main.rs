//! Expiration sweeper binary.
//!
//! Loads configuration, installs logging and runs the periodic sweep over an
//! in-memory marketplace until Ctrl-C.

use anyhow::Context;
use clap::Parser;
use procurement_engine::application::services::marketplace::Marketplace;
use procurement_engine::config::MarketplaceConfig;
use procurement_engine::infrastructure::telemetry::init_tracing;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "procurement-sweeper", version, about = "Expires overdue marketplace listings")]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "PROCUREMENT_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `sweep_interval_secs`.
    #[arg(long)]
    interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = MarketplaceConfig::load(args.config.as_deref())
        .context("loading marketplace configuration")?;
    if let Some(secs) = args.interval_secs {
        config.sweep_interval_secs = secs;
        config.validate().context("validating --interval-secs")?;
    }
    init_tracing(config.log_format, &config.log_filter).context("installing tracing")?;

    let every: Duration = config.sweep_interval();
    let market = Marketplace::in_memory(config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = market.sweeper().spawn(every, shutdown_rx);

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    info!("shutdown requested");
    shutdown_tx.send(true).context("signalling sweeper")?;
    handle.await.context("joining sweeper task")?;
    Ok(())
}

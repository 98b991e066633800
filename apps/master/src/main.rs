//! EngineDock master entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// EngineDock master — receives engine uploads over HTTP and stores them
/// under `<working dir>/lib/<kind>/`.
#[derive(Parser, Debug)]
#[command(name = "enginedock-master", version, about)]
struct Args {
    /// Configuration file (created with defaults if missing).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting EngineDock master"
    );

    let config = config::Config::load(args.config.as_deref())?;
    tracing::info!(listen = %config.listen, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config))?;

    tracing::info!("master shut down cleanly");
    Ok(())
}

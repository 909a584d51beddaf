//! Speed Editor driver CLI

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use cli::{Cli, Commands};
use commands::Context;
use speededitor_driver::DriverConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so event output on stdout stays clean
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(DriverConfig::default_path);
    debug!("Loading config from {:?}", config_path);
    let mut config = DriverConfig::load(&config_path)?;
    if let Some(path) = cli.path {
        config.device.path = Some(path);
    }
    let ctx = Context {
        config,
        config_path,
    };

    match cli.command {
        Commands::Monitor { json } => commands::monitor::run(&ctx, json).await,
        Commands::Auth => commands::device::auth(&ctx).await,
        Commands::Led { key, action } => commands::device::led(&ctx, &key, action).await,
        Commands::Mode { mode } => commands::device::mode(&ctx, mode).await,
        Commands::Keys => commands::utility::keys(),
        Commands::Response { challenge } => commands::utility::response(&challenge),
        Commands::Config { save } => commands::utility::config(&ctx, save),
    }
}

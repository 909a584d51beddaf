//! Command handlers for the CLI application.
//!
//! - `monitor`: live event output
//! - `device`: commands that talk to the surface (auth, led, mode)
//! - `utility`: offline commands (keys, response, config)

pub mod device;
pub mod monitor;
pub mod utility;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use speededitor::{Session, SurfaceEvent};
use speededitor_driver::{open_transport, DriverConfig};
use tokio::sync::{mpsc, Notify};
use tracing::{info, warn};

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Everything a command needs from the command line and config file
pub struct Context {
    pub config: DriverConfig,
    pub config_path: PathBuf,
}

/// Open the configured device and start a session on it
pub async fn open_session(ctx: &Context) -> anyhow::Result<(Session, mpsc::Receiver<SurfaceEvent>)> {
    let transport = open_transport(&ctx.config.device).context("Failed to open Speed Editor")?;
    let info = transport.device_info();
    info!(
        "Connected to {} ({:04x}:{:04x})",
        info.product_name.as_deref().unwrap_or("Speed Editor"),
        info.vid,
        info.pid
    );

    let started = Session::start(transport, &ctx.config.session, ctx.config.wheel.clone())
        .await
        .context("Failed to start session")?;
    Ok(started)
}

/// Set up a Ctrl-C handler that wakes the returned `Notify`
pub fn setup_interrupt_handler() -> Arc<Notify> {
    let interrupted = Arc::new(Notify::new());
    let handler = Arc::clone(&interrupted);

    if let Err(e) = ctrlc::set_handler(move || handler.notify_one()) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    interrupted
}

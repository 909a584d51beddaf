//! Commands that talk to the surface.

use anyhow::{bail, Context as _};
use speededitor::{key_by_name, Authenticator, WheelMode};
use speededitor_driver::open_transport;
use speededitor_transport::SerializedTransport;

use super::{open_session, CommandResult, Context};
use crate::cli::LedAction;

/// Run one handshake and report the re-auth interval
pub async fn auth(ctx: &Context) -> CommandResult {
    let transport = open_transport(&ctx.config.device).context("Failed to open Speed Editor")?;
    let transport = SerializedTransport::new(transport);

    let auth = Authenticator::new();
    let interval = auth.authenticate(&transport).await?;
    println!("Authenticated");
    println!("Re-auth interval: {}s", interval.as_secs());

    transport.close().await?;
    Ok(())
}

/// Set, clear or toggle one key LED
pub async fn led(ctx: &Context, name: &str, action: LedAction) -> CommandResult {
    let Some(key) = key_by_name(name) else {
        bail!("Unknown key '{name}' (run `speededitor keys` for the list)");
    };

    let (session, _events) = open_session(ctx).await?;
    let lit = match action {
        LedAction::On => session.set_key_led(key.logical_code, true).await.map(|()| true),
        LedAction::Off => session.set_key_led(key.logical_code, false).await.map(|()| false),
        LedAction::Toggle => session.toggle_key_led(key.logical_code).await,
    };
    let lit = match lit {
        Ok(lit) => lit,
        Err(e) => {
            session.close().await?;
            return Err(e.into());
        }
    };

    println!("{}: {}", key.name, if lit { "on" } else { "off" });
    session.close().await?;
    Ok(())
}

/// Select the wheel mode
pub async fn mode(ctx: &Context, mode: WheelMode) -> CommandResult {
    let (session, _events) = open_session(ctx).await?;
    let result = session.set_wheel_mode(mode).await;
    session.close().await?;
    result?;

    println!("Wheel mode: {mode}");
    Ok(())
}

//! Live event monitor.

use speededitor::SurfaceEvent;
use tracing::info;

use super::{open_session, setup_interrupt_handler, CommandResult, Context};

/// Print events until Ctrl-C or the device goes away
pub async fn run(ctx: &Context, json: bool) -> CommandResult {
    let interrupted = setup_interrupt_handler();
    let (session, mut events) = open_session(ctx).await?;

    info!("Monitoring. Press Ctrl+C to exit.");

    loop {
        tokio::select! {
            _ = interrupted.notified() => {
                info!("Interrupted");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                if json {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    println!("{}", format_event(&event));
                }
                if event.is_terminal() {
                    break;
                }
            }
        }
    }

    session.close().await?;
    Ok(())
}

fn format_event(event: &SurfaceEvent) -> String {
    match event {
        SurfaceEvent::Pressed { key } => format!("▼ {:<12} ({})", key.name, key.label),
        SurfaceEvent::Released { key } => format!("▲ {:<12} ({})", key.name, key.label),
        SurfaceEvent::Wheel { mode, value } => format!("⟳ {mode:<8} {value:>4}"),
        SurfaceEvent::WheelModeChanged { mode } => format!("Wheel mode: {mode}"),
        SurfaceEvent::Authenticated { interval_secs } => {
            format!("Authenticated (re-auth every {interval_secs}s)")
        }
        SurfaceEvent::AuthenticationFailed { step } => format!("Authentication failed at {step}"),
        SurfaceEvent::Disconnected { reason } => format!("Disconnected: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speededitor::{key, AuthStep, WheelMode};

    #[test]
    fn test_format_events() {
        assert_eq!(
            format_event(&SurfaceEvent::Pressed { key: &key::CAM1 }),
            "▼ CAM1         (CAM1)"
        );
        assert_eq!(
            format_event(&SurfaceEvent::Wheel {
                mode: WheelMode::Shuttle,
                value: -3
            }),
            "⟳ shuttle    -3"
        );
        assert_eq!(
            format_event(&SurfaceEvent::AuthenticationFailed {
                step: AuthStep::GetStatus
            }),
            "Authentication failed at get_status"
        );
    }

    #[test]
    fn test_json_events() {
        let json = serde_json::to_string(&SurfaceEvent::Wheel {
            mode: WheelMode::Jog,
            value: 42,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"wheel","mode":"jog","value":42}"#);

        let json = serde_json::to_value(SurfaceEvent::Released { key: &key::CUT }).unwrap();
        assert_eq!(json["type"], "released");
        assert_eq!(json["key"]["name"], "CUT");
        assert_eq!(json["key"]["key_code"], 0x0f);
    }
}

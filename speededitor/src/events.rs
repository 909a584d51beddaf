//! Events delivered to the application

use serde::Serialize;

use crate::auth::AuthStep;
use crate::keys::KeyDescriptor;
use crate::wheel::{WheelEvent, WheelMode};

/// Something the application should know about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceEvent {
    /// A key went down
    Pressed { key: &'static KeyDescriptor },
    /// A key came up
    Released { key: &'static KeyDescriptor },
    /// Wheel value in the active mode
    Wheel { mode: WheelMode, value: i32 },
    /// The wheel mode changed, from a mode key or the API
    WheelModeChanged { mode: WheelMode },
    /// A handshake succeeded; the next one is due after `interval_secs`
    Authenticated { interval_secs: u64 },
    /// A re-authentication failed; the session keeps running
    AuthenticationFailed { step: AuthStep },
    /// The device is gone; no further events follow
    Disconnected { reason: String },
}

impl From<WheelEvent> for SurfaceEvent {
    fn from(event: WheelEvent) -> Self {
        Self::Wheel {
            mode: event.mode,
            value: event.value,
        }
    }
}

impl SurfaceEvent {
    /// Whether this is the last event of a session
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::key;

    #[test]
    fn test_wheel_event_conversion() {
        let event: SurfaceEvent = WheelEvent {
            mode: WheelMode::Scroll,
            value: -2,
        }
        .into();
        assert_eq!(
            event,
            SurfaceEvent::Wheel {
                mode: WheelMode::Scroll,
                value: -2
            }
        );
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_terminal_event() {
        let event = SurfaceEvent::Disconnected {
            reason: "unplugged".into(),
        };
        assert!(event.is_terminal());
        assert!(!SurfaceEvent::Pressed { key: &key::CUT }.is_terminal());
    }
}

//! Surface error types

use speededitor_transport::TransportError;
use thiserror::Error;

use crate::auth::AuthError;

/// Errors from surface operations
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Handshake failed
    #[error(transparent)]
    Authentication(#[from] AuthError),

    /// No key has this logical code
    #[error("Unknown key: {0}")]
    UnknownKey(u8),

    /// Key has no LED
    #[error("Key {0} has no LED")]
    NoLed(&'static str),

    /// Key LED is driven by the wheel mode
    #[error("Key {0} is reserved for wheel mode selection")]
    ReservedKey(&'static str),

    /// Wheel tuning that would break the value math
    #[error("Invalid wheel config: {0}")]
    InvalidConfig(String),

    /// Transport does not deliver input reports
    #[error("Transport has no input report stream")]
    NoInputStream,

    /// Session already shut down
    #[error("Session closed")]
    SessionClosed,
}

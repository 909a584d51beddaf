//! Protocol engine for the Blackmagic Speed Editor
//!
//! Sits on top of a [`speededitor_transport::Transport`] and provides:
//! - the authentication handshake that unlocks the surface ([`auth`])
//! - input report decoding and key press/release edges ([`decoder`], [`edge`])
//! - key LED state ([`led`]) and wheel mode handling ([`wheel`])
//! - a [`Session`] tying them together and delivering [`SurfaceEvent`]s
//!
//! # Example
//!
//! ```no_run
//! use speededitor::{Session, SessionConfig, SurfaceEvent, WheelConfig};
//! use speededitor_transport::BoxedTransport;
//!
//! # async fn run(transport: BoxedTransport) -> Result<(), speededitor::SurfaceError> {
//! let (session, mut events) =
//!     Session::start(transport, &SessionConfig::default(), WheelConfig::default()).await?;
//!
//! while let Some(event) = events.recv().await {
//!     if let SurfaceEvent::Pressed { key } = event {
//!         println!("{} pressed", key.name);
//!     }
//! }
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod decoder;
pub mod edge;
pub mod error;
pub mod events;
pub mod keys;
pub mod led;
pub mod session;
pub mod wheel;

pub use auth::{compute_response, AuthError, AuthPhase, AuthState, AuthStep, Authenticator};
pub use decoder::{decode_report, DecodedReport, KeyStateSnapshot, WheelDelta};
pub use edge::{KeyEdge, KeyEdgeTracker};
pub use error::SurfaceError;
pub use events::SurfaceEvent;
pub use keys::{key, key_by_code, key_by_logical, key_by_name, KeyDescriptor, LedGroup, KEYS};
pub use led::{LedReport, LedStateEncoder};
pub use session::{Session, SessionConfig};
pub use wheel::{AccumulatorPolicy, WheelConfig, WheelEvent, WheelMode, WheelModeController};

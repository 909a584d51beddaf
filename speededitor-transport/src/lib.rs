//! Transport abstraction layer for Blackmagic Speed Editor communication
//!
//! The surface speaks three kinds of HID traffic:
//!
//! - Input reports (keys, wheel) pushed by the device
//! - Output reports (LED state) written by the host
//! - Feature report 6, used for the authentication handshake
//!
//! [`Transport`] is the contract the protocol engine consumes. [`HidTransport`]
//! implements it on top of `hidapi`, and [`SerializedTransport`] adds the
//! exclusive-access discipline that keeps multi-step exchanges atomic.

pub mod device_registry;
pub mod error;
pub mod reader;
pub mod serialized;
pub mod types;

mod hid;

pub use device_registry::{is_supported, PID_SPEED_EDITOR, VENDOR_ID};
pub use error::TransportError;
pub use hid::HidTransport;
pub use reader::ReaderConfig;
pub use serialized::{ExclusiveTransport, SerializedTransport};
pub use types::{InputReport, TransportDeviceInfo, TransportEvent};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

/// The core transport trait - all backends implement this
///
/// Raw I/O only: no retries, no header checks. Callers that need several
/// reports exchanged without interleaving go through [`SerializedTransport`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write an output report (report ID first)
    async fn write(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Send a feature report (report ID first)
    async fn send_feature_report(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Read a feature report
    ///
    /// # Arguments
    /// * `report_id` - Feature report to request
    /// * `len` - Buffer length including the report ID byte
    ///
    /// # Returns
    /// Report bytes, report ID first
    async fn get_feature_report(&self, report_id: u8, len: usize)
        -> Result<Vec<u8>, TransportError>;

    /// Subscribe to inbound input reports
    ///
    /// Reports are delivered in arrival order. A [`TransportEvent::Closed`]
    /// is the last event a healthy subscriber sees.
    /// Returns None if the transport has no input endpoint.
    fn subscribe_reports(&self) -> Option<broadcast::Receiver<TransportEvent>>;

    /// Get device information
    fn device_info(&self) -> &TransportDeviceInfo;

    /// Close the transport gracefully
    async fn close(&self) -> Result<(), TransportError>;
}

/// Type alias for a boxed transport
pub type BoxedTransport = Arc<dyn Transport>;

//! Common types for transport layer

/// Device identification information
#[derive(Debug, Clone)]
pub struct TransportDeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// Device path or identifier (transport-specific)
    pub device_path: String,
    /// Serial number if available
    pub serial: Option<String>,
    /// Product name if available
    pub product_name: Option<String>,
}

/// Raw input report pushed by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputReport {
    /// Report bytes, report ID first
    pub data: Vec<u8>,
}

impl InputReport {
    /// Create a new input report
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// Events delivered on the inbound stream of a transport
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// An input report arrived
    Report(InputReport),
    /// The inbound stream failed; nothing follows this event
    Closed {
        /// Human-readable failure reason
        reason: String,
    },
}

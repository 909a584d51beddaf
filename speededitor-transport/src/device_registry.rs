//! USB identifiers for supported control surfaces

/// Blackmagic Design USB vendor ID
pub const VENDOR_ID: u16 = 0x1edb;

/// Speed Editor product ID
pub const PID_SPEED_EDITOR: u16 = 0xda0e;

/// All product IDs handled by this transport
pub const SUPPORTED_PIDS: &[u16] = &[PID_SPEED_EDITOR];

/// Check if a VID/PID pair is a supported surface
pub fn is_supported(vid: u16, pid: u16) -> bool {
    vid == VENDOR_ID && SUPPORTED_PIDS.contains(&pid)
}

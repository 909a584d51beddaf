//! Input report decoding
//!
//! Reports are classified by their leading byte:
//! - `0x04`: key report, `[04, k0_lo, k0_hi, k1_lo, k1_hi, ...]` (one slot per held key)
//! - `0x03`: wheel report, `[03, mode, d0, d1, d2, d3, ...]` (signed LE delta)
//!
//! Anything else is a vendor report this layer does not need and is dropped.

use tracing::debug;

use crate::keys::{key_by_code, KeyDescriptor};

/// Input report ID constants
pub mod report_id {
    /// Wheel movement
    pub const WHEEL: u8 = 0x03;
    /// Held keys
    pub const KEYS: u8 = 0x04;
}

/// Keys held at the time of one report, in slot order; empty slots are NONE
pub type KeyStateSnapshot = Vec<&'static KeyDescriptor>;

/// Raw wheel movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelDelta {
    /// Mode byte as reported by the device; not interpreted here
    pub device_mode: u8,
    /// Signed movement since the previous report
    pub delta: i32,
}

/// A decoded input report
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedReport {
    Keys(KeyStateSnapshot),
    Wheel(WheelDelta),
}

/// Decode one raw input report
///
/// Returns `None` for report types this layer ignores. Unknown key codes
/// decode as NONE rather than failing.
pub fn decode_report(data: &[u8]) -> Option<DecodedReport> {
    let (&kind, payload) = data.split_first()?;

    match kind {
        report_id::KEYS => {
            let snapshot = payload
                .chunks_exact(2)
                .map(|slot| key_by_code(u16::from_le_bytes([slot[0], slot[1]])))
                .collect();
            Some(DecodedReport::Keys(snapshot))
        }
        report_id::WHEEL if payload.len() >= 5 => Some(DecodedReport::Wheel(WheelDelta {
            device_mode: payload[0],
            delta: i32::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]),
        })),
        _ => {
            debug!("Ignoring input report {:02X?}", &data[..data.len().min(8)]);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::key;

    #[test]
    fn test_decode_key_report() {
        // CAM1 and CUT held, remaining slots empty
        let report = [0x04, 0x33, 0x00, 0x0f, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        match decode_report(&report) {
            Some(DecodedReport::Keys(snapshot)) => {
                assert_eq!(snapshot.len(), 6);
                assert_eq!(*snapshot[0], key::CAM1);
                assert_eq!(*snapshot[1], key::CUT);
                assert!(snapshot[2..].iter().all(|k| k.is_none()));
            }
            other => panic!("Expected key snapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_key_code_maps_to_none() {
        let report = [0x04, 0xff, 0x7f, 0x3c, 0x00];
        match decode_report(&report) {
            Some(DecodedReport::Keys(snapshot)) => {
                assert!(snapshot[0].is_none());
                assert_eq!(*snapshot[1], key::STOP_PLAY);
            }
            other => panic!("Expected key snapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_wheel_report() {
        // delta = -720 (0xFFFFFD30)
        let report = [0x03, 0x01, 0x30, 0xfd, 0xff, 0xff, 0x00];
        assert_eq!(
            decode_report(&report),
            Some(DecodedReport::Wheel(WheelDelta {
                device_mode: 1,
                delta: -720
            }))
        );
    }

    #[test]
    fn test_ignored_reports() {
        assert_eq!(decode_report(&[]), None);
        assert_eq!(decode_report(&[0x01, 0x02, 0x03]), None);
        assert_eq!(decode_report(&[0x06, 0x00]), None);
        // Truncated wheel report
        assert_eq!(decode_report(&[0x03, 0x00, 0x10]), None);
    }

    #[test]
    fn test_odd_trailing_byte_is_dropped() {
        match decode_report(&[0x04, 0x1d, 0x00, 0x1c]) {
            Some(DecodedReport::Keys(snapshot)) => {
                assert_eq!(snapshot.len(), 1);
                assert_eq!(*snapshot[0], key::JOG);
            }
            other => panic!("Expected key snapshot, got {other:?}"),
        }
    }
}

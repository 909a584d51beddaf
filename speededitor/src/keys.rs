//! Static key table for the Speed Editor
//!
//! Key codes, LED bits and LED groups are fixed by the hardware. Logical codes
//! are the stable indices handed to applications.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

/// Number of physical keys
pub const KEY_COUNT: usize = 43;

/// Independent LED bitmask domains; the value doubles as the output report ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum LedGroup {
    /// Backlit editing and camera keys
    RegularKeys = 0x02,
    /// JOG / SHTL / SCRL indicators
    WheelKeys = 0x04,
}

impl LedGroup {
    /// Output report ID addressing this group
    pub fn report_id(self) -> u8 {
        self as u8
    }

    /// All LED groups
    pub const ALL: &'static [LedGroup] = &[LedGroup::RegularKeys, LedGroup::WheelKeys];
}

/// Position of a key's LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedSlot {
    pub group: LedGroup,
    pub bit: u8,
}

impl LedSlot {
    /// Bitmask with only this LED set
    pub fn mask(self) -> u32 {
        1 << self.bit
    }
}

/// One physical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyDescriptor {
    /// Device-native identifier found in key reports
    pub key_code: u16,
    /// Stable index exposed to applications
    pub logical_code: u8,
    /// Identifier used by the CLI and config files
    pub name: &'static str,
    /// Text printed on the keycap
    pub label: &'static str,
    /// LED position, for backlit keys
    pub led: Option<LedSlot>,
}

impl KeyDescriptor {
    /// "No key in this slot"
    pub const NONE: KeyDescriptor = KeyDescriptor {
        key_code: 0x00,
        logical_code: 0,
        name: "NONE",
        label: "",
        led: None,
    };

    const fn plain(key_code: u16, logical_code: u8, name: &'static str, label: &'static str) -> Self {
        Self {
            key_code,
            logical_code,
            name,
            label,
            led: None,
        }
    }

    const fn lit(
        key_code: u16,
        logical_code: u8,
        name: &'static str,
        label: &'static str,
        group: LedGroup,
        bit: u8,
    ) -> Self {
        Self {
            key_code,
            logical_code,
            name,
            label,
            led: Some(LedSlot { group, bit }),
        }
    }

    /// Check if this is the NONE sentinel
    pub fn is_none(&self) -> bool {
        self.key_code == KeyDescriptor::NONE.key_code
    }
}

/// Individual key descriptors
pub mod key {
    use super::{KeyDescriptor as K, LedGroup::RegularKeys as R, LedGroup::WheelKeys as W};

    pub const SMART_INSRT: K = K::plain(0x01, 0, "SMART_INSRT", "SMART INSRT [CLIP]");
    pub const APPND: K = K::plain(0x02, 1, "APPND", "APPND [CLIP]");
    pub const RIPL_OWR: K = K::plain(0x03, 2, "RIPL_OWR", "RIPL O/WR");
    pub const CLOSE_UP: K = K::lit(0x04, 3, "CLOSE_UP", "CLOSE UP [YPOS]", R, 0);
    pub const PLACE_ON_TOP: K = K::plain(0x05, 4, "PLACE_ON_TOP", "PLACE ON TOP");
    pub const SRC_OWR: K = K::plain(0x06, 5, "SRC_OWR", "SCR O/WR");

    pub const IN: K = K::plain(0x07, 6, "IN", "IN");
    pub const OUT: K = K::plain(0x08, 7, "OUT", "OUT");
    pub const TRIM_IN: K = K::plain(0x09, 8, "TRIM_IN", "TRIM IN");
    pub const TRIM_OUT: K = K::plain(0x0a, 9, "TRIM_OUT", "TRIM OUT");
    pub const ROLL: K = K::plain(0x0b, 10, "ROLL", "ROLL [SLIDE]");
    pub const SLIP_SRC: K = K::plain(0x0c, 11, "SLIP_SRC", "SLIP SRC");
    pub const SLIP_DEST: K = K::plain(0x0d, 12, "SLIP_DEST", "SLIP DEST");
    pub const TRANS_DUR: K = K::plain(0x0e, 13, "TRANS_DUR", "TRANS DUR [SET]");
    pub const CUT: K = K::lit(0x0f, 14, "CUT", "CUT", R, 1);
    pub const DIS: K = K::lit(0x10, 15, "DIS", "DIS", R, 2);
    pub const SMTH_CUT: K = K::lit(0x11, 16, "SMTH_CUT", "SMTH CUT", R, 3);

    pub const SOURCE: K = K::plain(0x1a, 17, "SOURCE", "SOURCE");
    pub const TIMELINE: K = K::plain(0x1b, 18, "TIMELINE", "TIMELINE");

    pub const JOG: K = K::lit(0x1d, 19, "JOG", "JOG", W, 0);
    pub const SHTL: K = K::lit(0x1c, 20, "SHTL", "SHTL", W, 1);
    pub const SCRL: K = K::lit(0x1e, 21, "SCRL", "SCRL", W, 2);

    pub const ESC: K = K::plain(0x31, 22, "ESC", "ESC [UNDO]");
    pub const SYNC_BIN: K = K::plain(0x1f, 23, "SYNC_BIN", "SYNC BIN");
    pub const AUDIO_LEVEL: K = K::plain(0x2c, 24, "AUDIO_LEVEL", "AUDIO LEVEL [MARK]");
    pub const FULL_VIEW: K = K::plain(0x2d, 25, "FULL_VIEW", "FULL VIEW [RVW]");
    pub const TRANS: K = K::lit(0x22, 26, "TRANS", "TRANS [TITLE]", R, 4);
    pub const SPLIT: K = K::plain(0x2f, 27, "SPLIT", "SPLIT [MOVE]");
    pub const SNAP: K = K::lit(0x2e, 28, "SNAP", "SNAP [:]", R, 5);
    pub const RIPL_DEL: K = K::plain(0x2b, 29, "RIPL_DEL", "RIPL DEL");

    pub const CAM1: K = K::lit(0x33, 30, "CAM1", "CAM1", R, 14);
    pub const CAM2: K = K::lit(0x34, 31, "CAM2", "CAM2", R, 15);
    pub const CAM3: K = K::lit(0x35, 32, "CAM3", "CAM3", R, 16);
    pub const CAM4: K = K::lit(0x36, 33, "CAM4", "CAM4", R, 10);
    pub const CAM5: K = K::lit(0x37, 34, "CAM5", "CAM5", R, 11);
    pub const CAM6: K = K::lit(0x38, 35, "CAM6", "CAM6", R, 12);
    pub const CAM7: K = K::lit(0x39, 36, "CAM7", "CAM7", R, 6);
    pub const CAM8: K = K::lit(0x3a, 37, "CAM8", "CAM8", R, 7);
    pub const CAM9: K = K::lit(0x3b, 38, "CAM9", "CAM9", R, 8);
    pub const LIVE_OWR: K = K::lit(0x30, 39, "LIVE_OWR", "LIVE O/WR [RND]", R, 9);
    pub const VIDEO_ONLY: K = K::lit(0x25, 40, "VIDEO_ONLY", "VIDEO ONLY", R, 13);
    pub const AUDIO_ONLY: K = K::lit(0x26, 41, "AUDIO_ONLY", "AUDIO ONLY", R, 17);
    pub const STOP_PLAY: K = K::plain(0x3c, 42, "STOP_PLAY", "STOP/PLAY");
}

/// All physical keys, in logical-code order
pub static KEYS: [KeyDescriptor; KEY_COUNT] = [
    key::SMART_INSRT,
    key::APPND,
    key::RIPL_OWR,
    key::CLOSE_UP,
    key::PLACE_ON_TOP,
    key::SRC_OWR,
    key::IN,
    key::OUT,
    key::TRIM_IN,
    key::TRIM_OUT,
    key::ROLL,
    key::SLIP_SRC,
    key::SLIP_DEST,
    key::TRANS_DUR,
    key::CUT,
    key::DIS,
    key::SMTH_CUT,
    key::SOURCE,
    key::TIMELINE,
    key::JOG,
    key::SHTL,
    key::SCRL,
    key::ESC,
    key::SYNC_BIN,
    key::AUDIO_LEVEL,
    key::FULL_VIEW,
    key::TRANS,
    key::SPLIT,
    key::SNAP,
    key::RIPL_DEL,
    key::CAM1,
    key::CAM2,
    key::CAM3,
    key::CAM4,
    key::CAM5,
    key::CAM6,
    key::CAM7,
    key::CAM8,
    key::CAM9,
    key::LIVE_OWR,
    key::VIDEO_ONLY,
    key::AUDIO_ONLY,
    key::STOP_PLAY,
];

static NONE_KEY: KeyDescriptor = KeyDescriptor::NONE;

static BY_CODE: OnceLock<HashMap<u16, &'static KeyDescriptor>> = OnceLock::new();

fn code_index() -> &'static HashMap<u16, &'static KeyDescriptor> {
    BY_CODE.get_or_init(|| KEYS.iter().map(|k| (k.key_code, k)).collect())
}

/// Look up a key by device key code; unknown codes map to NONE
pub fn key_by_code(key_code: u16) -> &'static KeyDescriptor {
    code_index().get(&key_code).copied().unwrap_or(&NONE_KEY)
}

/// Look up a key by logical code
pub fn key_by_logical(logical_code: u8) -> Option<&'static KeyDescriptor> {
    KEYS.get(logical_code as usize)
        .filter(|k| k.logical_code == logical_code)
}

/// Look up a key by name (case-insensitive, `-` and `_` interchangeable)
pub fn key_by_name(name: &str) -> Option<&'static KeyDescriptor> {
    let wanted = name.trim().to_ascii_uppercase().replace('-', "_");
    KEYS.iter().find(|k| k.name == wanted)
}

/// Keys whose LED lives in `group`
pub fn keys_in_group(group: LedGroup) -> impl Iterator<Item = &'static KeyDescriptor> {
    KEYS.iter()
        .filter(move |k| k.led.is_some_and(|slot| slot.group == group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_codes_unique() {
        let codes: HashSet<u16> = KEYS.iter().map(|k| k.key_code).collect();
        assert_eq!(codes.len(), KEY_COUNT);
        assert!(!codes.contains(&KeyDescriptor::NONE.key_code));
    }

    #[test]
    fn test_logical_codes_match_position() {
        for (i, k) in KEYS.iter().enumerate() {
            assert_eq!(k.logical_code as usize, i, "{} out of order", k.name);
        }
    }

    #[test]
    fn test_led_bits_unique_per_group() {
        for &group in LedGroup::ALL {
            let bits: Vec<u8> = keys_in_group(group).map(|k| k.led.unwrap().bit).collect();
            let unique: HashSet<u8> = bits.iter().copied().collect();
            assert_eq!(bits.len(), unique.len(), "duplicate bit in {group:?}");
            assert!(bits.iter().all(|&b| b < 32));
        }
        assert_eq!(keys_in_group(LedGroup::RegularKeys).count(), 18);
        assert_eq!(keys_in_group(LedGroup::WheelKeys).count(), 3);
    }

    #[test]
    fn test_lookup_by_code() {
        assert_eq!(key_by_code(0x33).name, "CAM1");
        assert_eq!(key_by_code(0x1d).name, "JOG");
        assert!(key_by_code(0x00).is_none());
        assert!(key_by_code(0x7f).is_none());
    }

    #[test]
    fn test_lookup_by_logical_and_name() {
        assert_eq!(key_by_logical(0).unwrap().name, "SMART_INSRT");
        assert_eq!(key_by_logical(42).unwrap().name, "STOP_PLAY");
        assert!(key_by_logical(43).is_none());

        assert_eq!(key_by_name("cam9").unwrap().key_code, 0x3b);
        assert_eq!(key_by_name("stop-play").unwrap().logical_code, 42);
        assert!(key_by_name("NONE").is_none());
    }

    #[test]
    fn test_labels() {
        let owr = key_by_code(0x06);
        assert_eq!(owr.name, "SRC_OWR");
        assert_eq!(owr.label, "SCR O/WR");
        assert_eq!(key::RIPL_OWR.label, "RIPL O/WR");
    }

    #[test]
    fn test_wheel_key_leds() {
        assert_eq!(
            key::JOG.led,
            Some(LedSlot {
                group: LedGroup::WheelKeys,
                bit: 0
            })
        );
        assert_eq!(key::SCRL.led.unwrap().mask(), 0b100);
        assert_eq!(LedGroup::WheelKeys.report_id(), 0x04);
    }
}

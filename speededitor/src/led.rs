//! Key LED state and output report encoding
//!
//! Each LED group is one 32-bit mask on the device. Writing a group sends the
//! whole mask: `[group, m0, m1, m2, m3]` (little-endian).

use std::collections::BTreeMap;

use crate::keys::{KeyDescriptor, LedGroup};

/// Length of an LED output report
pub const LED_REPORT_LEN: usize = 5;

/// One LED group's mask, ready to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedReport {
    pub group: LedGroup,
    pub mask: u32,
}

impl LedReport {
    /// All regular-key LEDs off; written once after the first handshake
    pub const BASELINE: LedReport = LedReport {
        group: LedGroup::RegularKeys,
        mask: 0,
    };

    /// Encode as an output report
    pub fn to_bytes(&self) -> [u8; LED_REPORT_LEN] {
        let mut buf = [0u8; LED_REPORT_LEN];
        buf[0] = self.group.report_id();
        buf[1..].copy_from_slice(&self.mask.to_le_bytes());
        buf
    }
}

/// Tracks LED masks per group and produces the reports that change them
#[derive(Debug, Default)]
pub struct LedStateEncoder {
    masks: BTreeMap<LedGroup, u32>,
}

impl LedStateEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mask of a group; untouched groups are all off
    pub fn mask(&self, group: LedGroup) -> u32 {
        self.masks.get(&group).copied().unwrap_or(0)
    }

    /// Whether a key's LED is lit
    pub fn is_lit(&self, key: &KeyDescriptor) -> bool {
        key.led
            .is_some_and(|slot| self.mask(slot.group) & slot.mask() != 0)
    }

    /// Turn a key's LED on or off
    ///
    /// Returns the report to write, or `None` when the key has no LED or the
    /// LED is already in the requested state.
    pub fn set(&mut self, key: &KeyDescriptor, on: bool) -> Option<LedReport> {
        let slot = key.led?;
        let current = self.mask(slot.group);
        let next = if on {
            current | slot.mask()
        } else {
            current & !slot.mask()
        };
        if next == current {
            return None;
        }
        Some(self.store(slot.group, next))
    }

    /// Flip a key's LED; always produces a report for keys with an LED
    pub fn toggle(&mut self, key: &KeyDescriptor) -> Option<LedReport> {
        let slot = key.led?;
        let next = self.mask(slot.group) ^ slot.mask();
        Some(self.store(slot.group, next))
    }

    /// Reset the state to what `report` puts on the device
    pub fn apply(&mut self, report: LedReport) {
        self.masks.insert(report.group, report.mask);
    }

    fn store(&mut self, group: LedGroup, mask: u32) -> LedReport {
        self.masks.insert(group, mask);
        LedReport { group, mask }
    }
}

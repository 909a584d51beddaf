//! Key press/release edge detection

use crate::decoder::KeyStateSnapshot;
use crate::keys::KeyDescriptor;

/// A change in a key's held state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Pressed(&'static KeyDescriptor),
    Released(&'static KeyDescriptor),
}

/// Diffs successive key snapshots into edges
#[derive(Debug, Default)]
pub struct KeyEdgeTracker {
    previous: KeyStateSnapshot,
}

impl KeyEdgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next snapshot and collect the edges it implies
    ///
    /// Presses come first in slot order, then releases in the previous
    /// snapshot's slot order. NONE never produces an edge.
    pub fn update(&mut self, current: KeyStateSnapshot) -> Vec<KeyEdge> {
        let mut edges = Vec::new();

        for (i, &key) in current.iter().enumerate() {
            if key.is_none()
                || contains(&self.previous, key)
                || contains(&current[..i], key)
            {
                continue;
            }
            edges.push(KeyEdge::Pressed(key));
        }

        for (i, &key) in self.previous.iter().enumerate() {
            if key.is_none() || contains(&current, key) || contains(&self.previous[..i], key) {
                continue;
            }
            edges.push(KeyEdge::Released(key));
        }

        self.previous = current;
        edges
    }
}

fn contains(snapshot: &[&'static KeyDescriptor], key: &KeyDescriptor) -> bool {
    snapshot.iter().any(|k| k.key_code == key.key_code)
}

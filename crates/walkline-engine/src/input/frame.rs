use std::collections::HashSet;

use super::types::Key;

/// Per-frame input deltas.
///
/// `InputState` provides the current state (held keys).
/// `InputFrame` provides the press transitions of the current frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Keys pressed this frame (press transitions only, repeats excluded).
    pub keys_pressed: HashSet<Key>,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.keys_pressed.clear();
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }
}

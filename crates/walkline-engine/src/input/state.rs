use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, KeyState};

/// Current input state for a single window.
///
/// Holds "is down" information. Per-frame transitions are recorded into an
/// `InputFrame`.
#[derive(Debug, Default)]
pub struct InputState {
    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            InputEvent::Focused(focused) => {
                if !focused {
                    // Keys released while unfocused never reach us.
                    self.keys_down.clear();
                }
            }

            InputEvent::Key { key, state } => match state {
                KeyState::Pressed => {
                    // A held key re-sends presses as repeats; only the first counts.
                    if self.keys_down.insert(key) {
                        frame.keys_pressed.insert(key);
                    }
                }
                KeyState::Released => {
                    self.keys_down.remove(&key);
                }
            },
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::input::{InputEvent, Key, KeyState};

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Returns `None` for events not represented by the input subsystem.
pub(crate) fn translate_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::KeyboardInput { event, .. } => {
            let state = match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            };

            Some(InputEvent::Key {
                key: map_key(event.physical_key),
                state,
            })
        }

        _ => None,
    }
}

/// Physical (layout-independent) key mapping: `Digit1` is the key left of `2`.
pub(crate) fn map_key(pk: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = pk else {
        // NativeKeyCode is not a u32 in winit 0.30; no stable numeric to preserve.
        return Key::Unknown(0);
    };

    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Digit0 | KeyCode::Numpad0 => Key::Digit0,
        KeyCode::Digit1 | KeyCode::Numpad1 => Key::Digit1,
        other => Key::Unknown(other as u32),
    }
}

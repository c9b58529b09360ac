use std::fmt;

/// Keyboard key identifier.
///
/// The runtime maps platform key codes into these variants where possible.
/// Keys not represented here arrive as `Key::Unknown(code)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Digit0,
    Digit1,

    /// Platform-dependent key not yet represented here.
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Platform-agnostic input events emitted by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key { key: Key, state: KeyState },

    /// Window focus change.
    Focused(bool),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Digit0 => f.write_str("0"),
            Key::Digit1 => f.write_str("1"),
            other => write!(f, "{other:?}"),
        }
    }
}

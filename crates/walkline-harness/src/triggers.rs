use std::str::FromStr;

use walkline_engine::input::{InputFrame, InputState, Key};

/// How a held key is interpreted.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TriggerMode {
    /// Fire once per press.
    Edge,
    /// Fire on every frame the key is held (rapid-fire regeneration).
    Level,
}

impl FromStr for TriggerMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edge" => Ok(TriggerMode::Edge),
            "level" => Ok(TriggerMode::Level),
            other => anyhow::bail!("unknown trigger mode `{other}` (expected `edge` or `level`)"),
        }
    }
}

/// Key bindings for the harness actions.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyTriggers {
    pub regenerate: Key,
    pub reload: Key,
    pub quit: Key,
    pub mode: TriggerMode,
}

/// Actions requested for one frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameTriggers {
    pub regenerate: bool,
    pub reload: bool,
    pub quit: bool,
}

impl FrameTriggers {
    /// Union of two frames' requests.
    pub fn merge(self, other: FrameTriggers) -> FrameTriggers {
        FrameTriggers {
            regenerate: self.regenerate || other.regenerate,
            reload: self.reload || other.reload,
            quit: self.quit || other.quit,
        }
    }
}

impl KeyTriggers {
    pub fn poll(&self, input: &InputState, frame: &InputFrame) -> FrameTriggers {
        let active = |key: Key| match self.mode {
            TriggerMode::Edge => frame.key_pressed(key),
            TriggerMode::Level => input.key_down(key),
        };

        FrameTriggers {
            regenerate: active(self.regenerate),
            reload: active(self.reload),
            // Quit is a one-shot regardless of mode.
            quit: frame.key_pressed(self.quit),
        }
    }
}

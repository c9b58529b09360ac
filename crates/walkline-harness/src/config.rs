use std::time::Duration;

use anyhow::{Context, Result};

use walkline_engine::device::GpuInit;
use walkline_engine::input::Key;
use walkline_engine::logging::LoggingConfig;
use walkline_engine::path::DEFAULT_SEGMENTS;
use walkline_engine::window::RuntimeConfig;
use winit::dpi::LogicalSize;

use crate::triggers::{KeyTriggers, TriggerMode};

/// Environment variable selecting `edge` or `level` key triggering.
pub const TRIGGER_MODE_ENV: &str = "WALKLINE_TRIGGER_MODE";

/// Harness settings. Fixed at start-up; there are no flags or config files.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub title: String,
    pub window_size: LogicalSize<f64>,
    pub segments: u32,
    pub triggers: KeyTriggers,
    pub clear_color: wgpu::Color,
    /// How often the smoothed timing is logged at `info` (every frame goes to `debug`).
    pub timing_summary_interval: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            title: "walkline".to_string(),
            window_size: LogicalSize::new(640.0, 480.0),
            segments: DEFAULT_SEGMENTS,
            triggers: KeyTriggers {
                regenerate: Key::Digit1,
                reload: Key::Digit0,
                quit: Key::Escape,
                mode: TriggerMode::Edge,
            },
            clear_color: wgpu::Color::BLACK,
            timing_summary_interval: Duration::from_secs(1),
        }
    }
}

impl HarnessConfig {
    /// Defaults, with the trigger mode overridable through [`TRIGGER_MODE_ENV`].
    pub fn from_env() -> Result<Self> {
        Self::default().with_trigger_mode(std::env::var(TRIGGER_MODE_ENV).ok().as_deref())
    }

    fn with_trigger_mode(mut self, value: Option<&str>) -> Result<Self> {
        if let Some(value) = value {
            self.triggers.mode = value
                .parse()
                .with_context(|| format!("invalid {TRIGGER_MODE_ENV}"))?;
        }
        Ok(self)
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: self.window_size,
            resizable: true,
        }
    }

    /// No vsync: the strip is a throughput probe, frame rate is unbounded.
    pub fn gpu(&self) -> GpuInit {
        GpuInit {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Immediate,
            desired_maximum_frame_latency: 1,
            ..GpuInit::default()
        }
    }

    /// Quiets wgpu internals unless `RUST_LOG` says otherwise.
    pub fn logging() -> LoggingConfig {
        LoggingConfig {
            env_filter: std::env::var("RUST_LOG")
                .is_err()
                .then(|| "info,wgpu_core=warn,wgpu_hal=warn,naga=warn".to_string()),
            ..LoggingConfig::default()
        }
    }
}

//! Random-walk line strip harness.
//!
//! Renders a freshly generated, normalized random walk as one line strip and
//! reports smoothed frame timing. `1` regenerates the walk, `0` re-uploads the
//! current one, `Esc` quits.

mod app;
mod config;
mod render_loop;
mod triggers;

use anyhow::Result;
use walkline_engine::logging::init_logging;
use walkline_engine::window::Runtime;

use crate::app::HarnessApp;
use crate::config::HarnessConfig;

fn main() -> Result<()> {
    init_logging(HarnessConfig::logging());
    let config = HarnessConfig::from_env()?;

    let keys = config.triggers;
    log::info!(
        "walkline: {} segments, [{}] regenerate, [{}] reload, [{}] quit ({:?}-triggered)",
        config.segments,
        keys.regenerate,
        keys.reload,
        keys.quit,
        keys.mode
    );

    let app = HarnessApp::new(config.clone())?;
    let app = Runtime::run(config.runtime(), config.gpu(), app)?;

    app.finish()
}

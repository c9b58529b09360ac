use std::time::Instant;

use anyhow::{anyhow, Result};
use walkline_engine::core::{App, AppControl, FrameCtx, RenderOutcome};
use walkline_engine::path::{Path, PathGenerator};
use walkline_engine::render::{LineStripRenderer, RenderCtx, RenderTarget};

use crate::config::HarnessConfig;
use crate::render_loop::{FrameStep, FrameTiming, RenderLoop, StripSink};

/// Routes loop uploads/draws to the GPU renderer for the current frame.
struct GpuStrip<'a, 'c, 't> {
    renderer: &'a mut LineStripRenderer,
    ctx: &'a RenderCtx<'c>,
    target: &'a mut RenderTarget<'t>,
}

impl StripSink for GpuStrip<'_, '_, '_> {
    fn upload(&mut self, path: &Path) {
        self.renderer.upload(self.ctx, path);
    }

    fn draw(&mut self, vertex_count: u32) {
        self.renderer.draw(self.target, vertex_count);
    }
}

pub struct HarnessApp {
    config: HarnessConfig,
    render_loop: RenderLoop,
    // Created on the first frame, once a device exists.
    renderer: Option<LineStripRenderer>,
    fatal: Option<anyhow::Error>,
    last_summary: Option<Instant>,
}

impl HarnessApp {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        let generator = PathGenerator::new(config.segments)?;
        Ok(Self {
            config,
            render_loop: RenderLoop::new(generator),
            renderer: None,
            fatal: None,
            last_summary: None,
        })
    }

    /// Surfaces an error that ended the loop, if any.
    pub fn finish(self) -> Result<()> {
        match self.fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: anyhow::Error) -> AppControl {
        log::error!("{err:#}");
        self.fatal = Some(err);
        AppControl::Exit
    }

    fn report(&mut self, ctx: &FrameCtx<'_, '_>, step: FrameStep, timing: FrameTiming) {
        let fps = timing.fps.unwrap_or(0.0);
        let marker = match (step.regenerated, step.uploaded) {
            (true, _) => " [regenerated]",
            (false, true) => " [uploaded]",
            (false, false) => "",
        };
        log::debug!(
            "dt: {:.6}, fps: {:.1}, drawn: {}{marker}",
            timing.dt,
            fps,
            step.drawn
        );

        let due = self
            .last_summary
            .is_none_or(|t| ctx.time.now.duration_since(t) >= self.config.timing_summary_interval);

        if due {
            log::info!("dt: {:.3} ms, fps: {:.0}", timing.dt * 1000.0, fps);
            ctx.window
                .set_title(&format!("{} | {:.0} fps", self.config.title, fps));
            self.last_summary = Some(ctx.time.now);
        }
    }
}

impl App for HarnessApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let triggers = self.config.triggers.poll(ctx.input, ctx.input_frame);
        if triggers.quit {
            log::info!("quit requested");
            ctx.runtime.exit();
            return AppControl::Continue;
        }

        let capacity = self.render_loop.path().vertex_count();
        let renderer = &mut self.renderer;
        let render_loop = &mut self.render_loop;

        let outcome = ctx.render(self.config.clear_color, |rctx, target| -> Result<_> {
            if renderer.is_none() {
                *renderer = Some(LineStripRenderer::new(rctx, capacity)?);
            }
            let Some(renderer) = renderer.as_mut() else {
                return Err(anyhow!("line strip renderer unavailable"));
            };

            let mut strip = GpuStrip {
                renderer,
                ctx: rctx,
                target,
            };
            Ok(render_loop.step(triggers, &mut strip))
        });

        let timing = self
            .render_loop
            .record_frame_time(ctx.time.interval);

        match outcome {
            RenderOutcome::Presented(Ok(step)) => self.report(ctx, step, timing),
            RenderOutcome::Presented(Err(err)) => return self.fail(err),
            RenderOutcome::Skipped => {
                log::debug!("frame skipped");
                self.render_loop.defer(triggers);
            }
            RenderOutcome::SurfaceLost => return self.fail(anyhow!("render surface lost")),
        }

        AppControl::Continue
    }

    fn on_exit(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            renderer.teardown();
        }
    }
}

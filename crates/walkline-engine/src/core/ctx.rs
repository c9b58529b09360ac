use winit::window::Window;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::{InputFrame, InputState};
use crate::render::{RenderCtx, RenderTarget, Viewport};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// Result of [`FrameCtx::render`].
#[derive(Debug)]
pub enum RenderOutcome<T> {
    /// The frame was drawn and presented; carries the draw callback's value.
    Presented(T),
    /// Recoverable surface error; nothing was drawn this frame.
    Skipped,
    /// The surface cannot be used any more; the app should exit.
    SurfaceLost,
}

/// Window handle exposed to the app.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window:       WindowCtx<'a>,
    pub gpu:          &'a mut Gpu<'w>,
    pub input:        &'a InputState,
    pub input_frame:  &'a InputFrame,
    pub time:         FrameTime,
    pub runtime:      &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires a frame, clears it with `clear`, calls `draw` with a ready
    /// [`RenderCtx`] and [`RenderTarget`], then presents.
    ///
    /// The viewport handed to `draw` is the current drawable size, so resizes
    /// are picked up every frame.
    ///
    /// `draw` is not called when the frame cannot be acquired.
    pub fn render<F, T>(&mut self, clear: wgpu::Color, draw: F) -> RenderOutcome<T>
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>) -> T,
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => RenderOutcome::SurfaceLost,
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        RenderOutcome::Skipped
                    }
                };
            }
        };

        // Clear pass; dropped before the encoder is borrowed by the target.
        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("walkline clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view:           &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load:  wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes:         None,
                occlusion_query_set:      None,
                multiview_mask:           None,
            });
        }

        let size = self.gpu.size();
        let viewport = Viewport::new(size.width, size.height);

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            viewport,
        );

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        let out = {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view, viewport);
            draw(&rctx, &mut target)
        };

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        RenderOutcome::Presented(out)
    }
}

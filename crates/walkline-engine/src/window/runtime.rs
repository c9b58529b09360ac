use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputFrame, InputState};
use crate::time::{FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "walkline".to_string(),
            initial_size: LogicalSize::new(640.0, 480.0),
            resizable: true,
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    exit: bool,
}

impl RuntimeCtx {
    pub fn exit(&mut self) {
        self.exit = true;
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and drives `app` until the window closes or the app
    /// asks to exit. Returns the app so callers can inspect its final state.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<A>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        if let Some(err) = state.startup_error.take() {
            return Err(err);
        }

        Ok(state.app)
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    window: Option<WindowEntry>,
    startup_error: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            window: None,
            startup_error: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        WindowEntryTryBuilder {
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init))
                    .context("GPU initialization failed for window")
            },
        }
        .try_build()
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let mut runtime_ctx = RuntimeCtx::default();
        let mut app_control = AppControl::Continue;

        let Some(entry) = self.window.as_mut() else { return };
        let app = &mut self.app;

        // Drive one frame.
        entry.with_mut(|fields| {
            let ft: FrameTime = fields.clock.tick();

            // Scope to ensure `ctx` is dropped before mutating frame state.
            {
                let mut ctx = FrameCtx {
                    window: WindowCtx {
                        window: fields.window,
                    },
                    gpu: fields.gpu,
                    input: fields.input_state,
                    input_frame: fields.input_frame,
                    time: ft,
                    runtime: &mut runtime_ctx,
                };

                app_control = app.on_frame(&mut ctx);
            }

            // Clear per-frame deltas after the frame is consumed.
            fields.input_frame.clear();
        });

        if app_control == AppControl::Exit || runtime_ctx.exit {
            self.request_exit(event_loop);
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_requested {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(entry) => {
                entry.with_window(|w| w.request_redraw());
                self.window = Some(entry);
            }
            Err(e) => {
                log::error!("failed to create window: {e:#}");
                self.startup_error = Some(e);
                self.request_exit(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Unthrottled: redraw as soon as the previous frame is presented.
        event_loop.set_control_flow(ControlFlow::Poll);

        if let Some(entry) = self.window.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (app, window) = (&mut self.app, &mut self.window);

        let Some(entry) = window.as_mut() else {
            return;
        };

        let mut exit_from_app_event = false;

        entry.with_mut(|fields| {
            if let Some(ev) = translate_window_event(&event) {
                fields
                    .input_state
                    .apply_event(fields.input_frame, ev);
            }

            if app.on_window_event(&event) == AppControl::Exit {
                exit_from_app_event = true;
            }
        });

        if exit_from_app_event {
            self.request_exit(event_loop);
            return;
        }

        // Runtime-managed window lifecycle / resize / redraw handling.
        match &event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // App resources go first, while the device they were created on is alive.
        self.app.on_exit();
        self.window = None;
        log::debug!("runtime exited");
    }
}

//! Per-frame path state machine.
//!
//! The loop owns the active path. Each frame it may regenerate it, may push it
//! to the GPU, and always draws it. GPU access goes through [`StripSink`] so the
//! sequencing can be exercised without a device.

use walkline_engine::path::{Path, PathGenerator};
use walkline_engine::time::FrameTimeEma;

use crate::triggers::FrameTriggers;

/// Destination for path uploads and strip draws.
pub trait StripSink {
    /// Replaces the device-side vertex data with `path`.
    fn upload(&mut self, path: &Path);

    /// Draws `vertex_count` vertices of the last upload as a line strip.
    fn draw(&mut self, vertex_count: u32);
}

/// What one call to [`RenderLoop::step`] did.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStep {
    pub regenerated: bool,
    pub uploaded: bool,
    pub drawn: u32,
}

/// Smoothed frame timing after one sample.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTiming {
    pub dt: f64,
    pub fps: Option<f64>,
}

pub struct RenderLoop {
    generator: PathGenerator,
    path: Path,
    ema: FrameTimeEma,
    // The first frame must upload: nothing is on the device yet.
    initial_upload_pending: bool,
    // Requests from frames that were never presented.
    deferred: FrameTriggers,
}

impl RenderLoop {
    /// Generates the initial path; it is uploaded on the first step.
    pub fn new(generator: PathGenerator) -> Self {
        let path = generator.generate();
        Self {
            generator,
            path,
            ema: FrameTimeEma::new(),
            initial_upload_pending: true,
            deferred: FrameTriggers::default(),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Holds the triggers of a frame that was skipped so the next
    /// [`step`](Self::step) still acts on them.
    pub fn defer(&mut self, triggers: FrameTriggers) {
        self.deferred = self.deferred.merge(triggers);
    }

    /// Applies this frame's triggers, plus any deferred ones, and draws the active path.
    ///
    /// Regeneration always implies an upload in the same frame.
    pub fn step<S>(&mut self, triggers: FrameTriggers, sink: &mut S) -> FrameStep
    where
        S: StripSink + ?Sized,
    {
        let triggers = std::mem::take(&mut self.deferred).merge(triggers);
        let mut upload = std::mem::take(&mut self.initial_upload_pending);

        if triggers.regenerate {
            self.path = self.generator.generate();
            upload = true;
            log::info!("+ update: {} vertices", self.path.len());
        }

        if triggers.reload {
            upload = true;
        }

        if upload {
            log::info!("+ reload");
            sink.upload(&self.path);
        }

        let drawn = self.path.vertex_count();
        sink.draw(drawn);

        FrameStep {
            regenerated: triggers.regenerate,
            uploaded: upload,
            drawn,
        }
    }

    /// Folds the instantaneous frame interval (seconds) into the moving average.
    pub fn record_frame_time(&mut self, dt: f64) -> FrameTiming {
        let dt = self.ema.update(dt);
        FrameTiming {
            dt,
            fps: self.ema.fps(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walkline_engine::path::Vertex;

    /// Models a device buffer: contents replaced wholesale on upload.
    #[derive(Default)]
    struct RecordingSink {
        buffer: Vec<u8>,
        uploaded_vertices: Option<u32>,
        uploads: usize,
        draws: Vec<u32>,
    }

    impl StripSink for RecordingSink {
        fn upload(&mut self, path: &Path) {
            self.buffer.clear();
            self.buffer.extend_from_slice(path.as_bytes());
            self.uploaded_vertices = Some(path.vertex_count());
            self.uploads += 1;
        }

        fn draw(&mut self, vertex_count: u32) {
            assert_eq!(
                Some(vertex_count),
                self.uploaded_vertices,
                "draw count must match the last upload"
            );
            self.draws.push(vertex_count);
        }
    }

    const SEGMENTS: u32 = 64;

    fn render_loop() -> RenderLoop {
        RenderLoop::new(PathGenerator::new(SEGMENTS).unwrap())
    }

    fn idle() -> FrameTriggers {
        FrameTriggers::default()
    }

    fn regenerate() -> FrameTriggers {
        FrameTriggers { regenerate: true, ..Default::default() }
    }

    fn reload() -> FrameTriggers {
        FrameTriggers { reload: true, ..Default::default() }
    }

    // ── first frame ───────────────────────────────────────────────────────

    #[test]
    fn first_frame_uploads_initial_path() {
        let mut rl = render_loop();
        let mut sink = RecordingSink::default();

        let step = rl.step(idle(), &mut sink);

        assert!(step.uploaded);
        assert!(!step.regenerated);
        assert_eq!(step.drawn, SEGMENTS + 1);
        assert_eq!(sink.buffer, rl.path().as_bytes());
    }

    #[test]
    fn idle_frames_draw_without_uploading() {
        let mut rl = render_loop();
        let mut sink = RecordingSink::default();
        rl.step(idle(), &mut sink);

        for _ in 0..5 {
            let step = rl.step(idle(), &mut sink);
            assert!(!step.uploaded);
        }
        assert_eq!(sink.uploads, 1);
        assert_eq!(sink.draws.len(), 6);
    }

    // ── regenerate / reload ───────────────────────────────────────────────

    #[test]
    fn regenerate_replaces_path_and_uploads() {
        let mut rl = render_loop();
        let mut sink = RecordingSink::default();
        rl.step(idle(), &mut sink);
        let before = rl.path().clone();

        let step = rl.step(regenerate(), &mut sink);

        assert!(step.regenerated && step.uploaded);
        assert_ne!(rl.path(), &before);
        assert_eq!(sink.buffer, rl.path().as_bytes());
    }

    #[test]
    fn regenerating_twice_does_not_grow_the_path() {
        let mut rl = render_loop();
        let mut sink = RecordingSink::default();

        rl.step(regenerate(), &mut sink);
        rl.step(regenerate(), &mut sink);

        assert_eq!(rl.path().len(), SEGMENTS as usize + 1);
        assert_eq!(
            sink.buffer.len(),
            (SEGMENTS as usize + 1) * std::mem::size_of::<Vertex>()
        );
    }

    #[test]
    fn reload_keeps_path() {
        let mut rl = render_loop();
        let mut sink = RecordingSink::default();
        rl.step(idle(), &mut sink);
        let before = rl.path().clone();

        let step = rl.step(reload(), &mut sink);

        assert!(step.uploaded && !step.regenerated);
        assert_eq!(rl.path(), &before);
    }

    #[test]
    fn repeated_reload_is_byte_identical() {
        let mut rl = render_loop();
        let mut sink = RecordingSink::default();
        rl.step(idle(), &mut sink);
        let once = sink.buffer.clone();

        rl.step(reload(), &mut sink);
        rl.step(reload(), &mut sink);

        assert_eq!(sink.uploads, 3);
        assert_eq!(sink.buffer, once);
    }

    #[test]
    fn regenerate_and_reload_together_upload_once() {
        let mut rl = render_loop();
        let mut sink = RecordingSink::default();
        rl.step(idle(), &mut sink);

        let both = FrameTriggers { regenerate: true, reload: true, quit: false };
        rl.step(both, &mut sink);

        assert_eq!(sink.uploads, 2);
    }

    // ── skipped frames ────────────────────────────────────────────────────

    #[test]
    fn deferred_regenerate_applies_on_next_frame() {
        let mut rl = render_loop();
        let mut sink = RecordingSink::default();
        rl.step(idle(), &mut sink);
        let before = rl.path().clone();

        // Press lands on a frame that never reached the closure.
        rl.defer(regenerate());
        let step = rl.step(idle(), &mut sink);

        assert!(step.regenerated && step.uploaded);
        assert_ne!(rl.path(), &before);
        assert_eq!(sink.buffer, rl.path().as_bytes());
    }

    #[test]
    fn deferred_triggers_merge_with_current() {
        let mut rl = render_loop();
        let mut sink = RecordingSink::default();
        rl.step(idle(), &mut sink);

        rl.defer(reload());
        rl.defer(idle());
        let step = rl.step(regenerate(), &mut sink);

        assert!(step.regenerated && step.uploaded);
        assert_eq!(sink.uploads, 2);
    }

    #[test]
    fn deferred_triggers_are_consumed_once() {
        let mut rl = render_loop();
        let mut sink = RecordingSink::default();
        rl.step(idle(), &mut sink);

        rl.defer(reload());
        rl.step(idle(), &mut sink);
        let step = rl.step(idle(), &mut sink);

        assert!(!step.uploaded);
        assert_eq!(sink.uploads, 2);
    }

    // ── draw invariant ────────────────────────────────────────────────────

    #[test]
    fn draw_count_tracks_last_upload_across_frames() {
        let mut rl = render_loop();
        let mut sink = RecordingSink::default();

        // Interleaved pattern: idle, regen, reload, both, held regen, ...
        let pattern = [
            idle(),
            regenerate(),
            idle(),
            reload(),
            FrameTriggers { regenerate: true, reload: true, quit: false },
            regenerate(),
            regenerate(),
            idle(),
            reload(),
            idle(),
        ];

        for (i, triggers) in pattern.iter().cycle().take(50).enumerate() {
            let step = rl.step(*triggers, &mut sink);
            assert_eq!(step.drawn, rl.path().vertex_count(), "frame {i}");
            assert_eq!(sink.buffer, rl.path().as_bytes(), "frame {i}");
        }

        assert_eq!(sink.draws.len(), 50);
    }

    // ── timing ────────────────────────────────────────────────────────────

    #[test]
    fn frame_timing_is_smoothed() {
        let mut rl = render_loop();
        let t = rl.record_frame_time(0.01);
        assert!((t.dt - 0.001).abs() < 1e-12);
        assert!((t.fps.unwrap() - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn timing_does_not_affect_path() {
        let mut rl = render_loop();
        let before = rl.path().clone();
        for _ in 0..10 {
            rl.record_frame_time(0.5);
        }
        assert_eq!(rl.path(), &before);
    }
}

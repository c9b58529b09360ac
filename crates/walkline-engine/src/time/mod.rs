//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `FrameClock` per window (or per render loop)
//! - call `tick()` once per presented frame to obtain `FrameTime`
//! - feed `FrameTime::dt` into a `FrameTimeEma` for a smoothed readout

mod ema;
mod frame_clock;

pub use ema::FrameTimeEma;
pub use frame_clock::{FrameClock, FrameTime};

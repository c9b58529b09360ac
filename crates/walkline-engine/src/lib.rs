//! Walkline engine crate.
//!
//! This crate owns the platform + GPU runtime pieces used by the harness:
//! path generation, the line-strip renderer, and the window/input/time plumbing
//! that drives them.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod path;
pub mod render;

//! Procedural path data.
//!
//! A [`Path`] is a normalized random walk laid out across the full width of
//! normalized device coordinates. Paths are produced by [`PathGenerator`] and
//! are immutable once built; regeneration always yields a fresh value.

mod generator;
mod vertex;

pub use generator::{normalize_y, Path, PathGenerator, DEFAULT_SEGMENTS, MAX_SEGMENTS};
pub use vertex::Vertex;

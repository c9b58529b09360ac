//! GPU rendering subsystem.
//!
//! Renderers own their GPU resources (pipelines, buffers) and record draws into
//! a `RenderTarget`.
//!
//! Convention: vertex positions are already in NDC; no projection is applied.

mod ctx;
mod line_strip;
mod shader;

pub use ctx::{RenderCtx, RenderTarget, Viewport};
pub use line_strip::{LineStripRenderer, UploadPlan};
pub use shader::{validate_wgsl, WgslShader, LINE_STRIP_SHADER};

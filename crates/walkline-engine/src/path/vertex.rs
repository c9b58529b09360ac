use bytemuck::{Pod, Zeroable};

/// Line-strip vertex.
///
/// `pos` is in normalized device coordinates. `color` is straight RGBA bytes;
/// the GPU reads it as `Unorm8x4`, so channels arrive in the shader as `[0, 1]`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub color: [u8; 4],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Unorm8x4   // color
    ];

    #[inline]
    pub const fn new(x: f32, y: f32, color: [u8; 4]) -> Self {
        Self { pos: [x, y], color }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos[0]
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos[1]
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

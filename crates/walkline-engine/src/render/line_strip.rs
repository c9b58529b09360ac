use anyhow::Result;

use crate::path::{Path, Vertex};
use crate::render::{RenderCtx, RenderTarget};

use super::shader::{validate_wgsl, LINE_STRIP_SHADER};

/// Smallest vertex buffer the renderer allocates, in bytes.
const MIN_CAPACITY_BYTES: u64 = 64 * std::mem::size_of::<Vertex>() as u64;

/// How an upload of `required` bytes fits the current vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UploadPlan {
    /// Contents fit; overwrite in place.
    Write,
    /// Buffer too small; replace it with one of `capacity` bytes, then write.
    Reallocate { capacity: u64 },
}

impl UploadPlan {
    pub fn for_upload(capacity: u64, required: u64) -> Self {
        if required <= capacity {
            return UploadPlan::Write;
        }
        UploadPlan::Reallocate {
            capacity: initial_capacity(required),
        }
    }
}

fn initial_capacity(required: u64) -> u64 {
    required.next_power_of_two().max(MIN_CAPACITY_BYTES)
}

/// Line-strip renderer: owns the shader pipeline and the vertex buffer.
///
/// Lifecycle:
/// - [`new`](Self::new) compiles the shader pair, builds the pipeline and the buffer
/// - [`upload`](Self::upload) replaces buffer contents with a whole [`Path`]
/// - [`draw`](Self::draw) records a line-strip pass over the uploaded vertices
/// - [`teardown`](Self::teardown) releases GPU objects; `Drop` does the same for
///   any exit path that skips it
pub struct LineStripRenderer {
    pipeline: Option<wgpu::RenderPipeline>,
    vertex_buffer: Option<wgpu::Buffer>,
    capacity_bytes: u64,
    uploaded_vertices: u32,
}

impl LineStripRenderer {
    /// Creates the pipeline and a vertex buffer sized for `capacity_vertices`.
    ///
    /// Fails when the shader does not compile or does not match the vertex layout.
    pub fn new(ctx: &RenderCtx<'_>, capacity_vertices: u32) -> Result<Self> {
        validate_wgsl(&LINE_STRIP_SHADER)?;

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(LINE_STRIP_SHADER.label),
            source: wgpu::ShaderSource::Wgsl(LINE_STRIP_SHADER.source.into()),
        });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("walkline line strip pipeline layout"),
                    bind_group_layouts: &[],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("walkline line strip pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(LINE_STRIP_SHADER.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(LINE_STRIP_SHADER.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let capacity = initial_capacity(
            u64::from(capacity_vertices) * std::mem::size_of::<Vertex>() as u64,
        );

        log::debug!("line strip renderer ready: {capacity} byte vertex buffer");

        Ok(Self {
            pipeline: Some(pipeline),
            vertex_buffer: Some(create_vertex_buffer(ctx.device, capacity)),
            capacity_bytes: capacity,
            uploaded_vertices: 0,
        })
    }

    /// Vertex count of the most recent upload.
    #[inline]
    pub fn uploaded_vertices(&self) -> u32 {
        self.uploaded_vertices
    }

    #[inline]
    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// Replaces the buffer contents with `path`.
    ///
    /// The buffer object is reused while it is large enough; a larger path
    /// replaces it once and destroys the old one.
    pub fn upload(&mut self, ctx: &RenderCtx<'_>, path: &Path) {
        let bytes = path.as_bytes();

        if let UploadPlan::Reallocate { capacity } =
            UploadPlan::for_upload(self.capacity_bytes, bytes.len() as u64)
        {
            if let Some(old) = self.vertex_buffer.take() {
                old.destroy();
            }
            self.vertex_buffer = Some(create_vertex_buffer(ctx.device, capacity));
            self.capacity_bytes = capacity;
            log::debug!("vertex buffer grown to {capacity} bytes");
        }

        let Some(buffer) = self.vertex_buffer.as_ref() else { return };
        ctx.queue.write_buffer(buffer, 0, bytes);
        self.uploaded_vertices = path.vertex_count();
    }

    /// Records a line strip over the first `vertex_count` uploaded vertices.
    ///
    /// The count is not checked against the last upload.
    pub fn draw(&self, target: &mut RenderTarget<'_>, vertex_count: u32) {
        if vertex_count == 0 || target.viewport.is_empty() {
            return;
        }

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(buffer) = self.vertex_buffer.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("walkline line strip pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let vp = target.viewport;
        rpass.set_viewport(0.0, 0.0, vp.width as f32, vp.height as f32, 0.0, 1.0);
        rpass.set_scissor_rect(0, 0, vp.width, vp.height);

        rpass.set_pipeline(pipeline);
        rpass.set_vertex_buffer(0, buffer.slice(..));
        rpass.draw(0..vertex_count, 0..1);
    }

    /// Releases the buffer and pipeline.
    ///
    /// Consumes the renderer, so it cannot run twice or be followed by a draw.
    pub fn teardown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let had_buffer = if let Some(buffer) = self.vertex_buffer.take() {
            buffer.destroy();
            true
        } else {
            false
        };
        let had_pipeline = self.pipeline.take().is_some();

        if had_buffer || had_pipeline {
            log::debug!("line strip renderer released");
        }

        self.capacity_bytes = 0;
        self.uploaded_vertices = 0;
    }
}

impl Drop for LineStripRenderer {
    fn drop(&mut self) {
        self.release();
    }
}

fn create_vertex_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("walkline line strip vbo"),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: u64 = std::mem::size_of::<Vertex>() as u64;

    #[test]
    fn fitting_upload_writes_in_place() {
        assert_eq!(UploadPlan::for_upload(1024, 1024), UploadPlan::Write);
        assert_eq!(UploadPlan::for_upload(1024, 12), UploadPlan::Write);
    }

    #[test]
    fn oversized_upload_reallocates_to_power_of_two() {
        assert_eq!(
            UploadPlan::for_upload(1024, 1025),
            UploadPlan::Reallocate { capacity: 2048 }
        );
    }

    #[test]
    fn capacity_has_a_floor() {
        assert_eq!(
            UploadPlan::for_upload(0, VERTEX),
            UploadPlan::Reallocate { capacity: MIN_CAPACITY_BYTES }
        );
    }

    #[test]
    fn repeated_uploads_of_one_path_never_reallocate() {
        let required = 100_001 * VERTEX;
        let capacity = initial_capacity(required);
        for _ in 0..3 {
            assert_eq!(UploadPlan::for_upload(capacity, required), UploadPlan::Write);
        }
    }

    #[test]
    fn capacities_are_copy_aligned() {
        for required in [1, 12, 1_200_012, 7_777_777] {
            let cap = initial_capacity(required);
            assert!(cap >= required);
            assert_eq!(cap % wgpu::COPY_BUFFER_ALIGNMENT, 0);
        }
    }
}

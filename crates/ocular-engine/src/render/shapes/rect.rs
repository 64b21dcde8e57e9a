use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::canvas::FramePass;
use crate::coords::Rect;
use crate::device::GpuContext;
use crate::paint::Color;
use crate::picking::id_to_color;
use crate::render::target::{color_targets, depth_state};
use crate::render::{ProgramDesc, ProgramError, ShaderProgram, Shared};

use super::common::{premul_alpha_blend, QuadVertex, ViewportUniform, QUAD_INDICES, QUAD_VERTICES};

/// A filled rectangle that also writes `pick_id` into the pick attachment.
///
/// `pick_id` is a registry id (alpha `0xFF`) or [`NOTHING`](crate::picking::NOTHING)
/// for decoration that should not be pickable.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickRect {
    pub rect: Rect,
    pub color: Color,
    pub pick_id: u32,
}

impl PickRect {
    pub fn new(rect: Rect, color: Color, pick_id: u32) -> Self {
        Self { rect, color, pick_id }
    }
}

struct Pipeline {
    gpu: Arc<GpuContext>,
    sample_count: u32,
    program: Option<Shared>,
    bind_group: wgpu::BindGroup,
    viewport_ubo: wgpu::Buffer,
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            self.gpu.shaders().release(program);
        }
    }
}

/// Instanced rectangle renderer for canvas frame passes.
///
/// Geometry is given in pixels of the canvas target, converted to NDC in the
/// vertex shader. Color is premultiplied and blended over what is already
/// drawn; the pick id overwrites.
pub struct PickRectRenderer {
    sample_mask: u64,
    pipeline: Option<Pipeline>,
    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
}

impl Default for PickRectRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PickRectRenderer {
    pub fn new() -> Self {
        Self { sample_mask: !0, pipeline: None, quad_vbo: None, quad_ibo: None }
    }

    /// Restricts writes to the samples whose bit is set in `mask`.
    ///
    /// Only meaningful on multisampled canvases; bit `i` is sample `i`.
    pub fn with_sample_mask(mut self, mask: u64) -> Self {
        self.sample_mask = mask;
        self
    }

    /// Draws `rects` in order into the frame.
    ///
    /// Empty and non-finite rectangles are skipped.
    pub fn render(&mut self, frame: &mut FramePass<'_, '_>, rects: &[PickRect]) -> Result<(), ProgramError> {
        let instances: Vec<RectInstance> = rects
            .iter()
            .filter_map(|r| {
                let rect = r.rect.normalized();
                if rect.is_empty() || !rect.is_finite() || !r.color.is_finite() {
                    return None;
                }
                Some(RectInstance {
                    origin: [rect.x, rect.y],
                    size: [rect.w, rect.h],
                    color: r.color.clamped().to_array(),
                    pick: id_to_color(r.pick_id),
                })
            })
            .collect();

        if instances.is_empty() {
            return Ok(());
        }

        self.ensure_pipeline(frame)?;
        self.ensure_static_buffers(frame);

        let token = frame.token();
        let (Some(pipeline), Some(quad_vbo), Some(quad_ibo)) =
            (self.pipeline.as_ref(), self.quad_vbo.as_ref(), self.quad_ibo.as_ref())
        else {
            return Ok(());
        };
        let Some(program) = pipeline.program.as_ref() else { return Ok(()) };

        let size = frame.size();
        let u = ViewportUniform {
            viewport: [size.width.max(1) as f32, size.height.max(1) as f32],
            _pad: [0.0; 2],
        };
        token.queue().write_buffer(&pipeline.viewport_ubo, 0, bytemuck::bytes_of(&u));

        // One buffer per call: several calls may share a frame.
        let instance_vbo = token.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ocular rect instance vbo"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let rpass = frame.render_pass();
        rpass.set_pipeline(program.pipeline());
        rpass.set_bind_group(0, &pipeline.bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..instances.len() as u32);
        Ok(())
    }

    fn ensure_pipeline(&mut self, frame: &FramePass<'_, '_>) -> Result<(), ProgramError> {
        let sample_count = frame.sample_count();
        if self.pipeline.as_ref().is_some_and(|p| p.sample_count == sample_count) {
            return Ok(());
        }
        // Return the old program to the cache before taking a new one.
        self.pipeline = None;

        let token = frame.token();
        let label = if self.sample_mask == !0 {
            format!("ocular.rect@x{sample_count}")
        } else {
            format!("ocular.rect@x{sample_count}/m{:#x}", self.sample_mask)
        };
        let buffers = [QuadVertex::layout(), RectInstance::layout()];
        let targets = color_targets(Some(premul_alpha_blend()));
        let desc = ProgramDesc {
            vertex_buffers: &buffers,
            targets: &targets,
            depth_stencil: Some(depth_state(false, wgpu::CompareFunction::Always)),
            sample_count,
            sample_mask: self.sample_mask,
            ..ProgramDesc::new(&label, include_str!("../shaders/rect.wgsl"))
        };

        let program = token
            .gpu()
            .shaders()
            .acquire(&label, || ShaderProgram::new(token, &desc))?;

        let viewport_ubo = token.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("ocular rect viewport ubo"),
            size: size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = token.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ocular rect bind group"),
            layout: &program.bind_group_layout(0),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        self.pipeline = Some(Pipeline {
            gpu: Arc::clone(token.gpu_arc()),
            sample_count,
            program: Some(program),
            bind_group,
            viewport_ubo,
        });
        Ok(())
    }

    fn ensure_static_buffers(&mut self, frame: &FramePass<'_, '_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }
        let device = frame.token().device();

        self.quad_vbo = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ocular rect quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_ibo = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ocular rect quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct RectInstance {
    origin: [f32; 2],
    size: [f32; 2],
    color: [f32; 4],
    pick: [f32; 4],
}

impl RectInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x2, // origin
        2 => Float32x2, // size
        3 => Float32x4, // color
        4 => Float32x4  // pick
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<RectInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

//! Programs the canvas runs around the caller's draw callback: background
//! fill, multisample resolve and presentation.
//!
//! All three draw the same full-viewport quad and share their programs
//! through the context's shader cache.

use bytemuck::{Pod, Zeroable};

use crate::context::ContextToken;
use crate::coords::PixelSize;
use crate::device::GpuContext;
use crate::paint::Color;

use super::target::{color_targets, depth_state};
use super::{ProgramDesc, ProgramError, RenderTarget, ShaderProgram, Shared, VertexArray, VertexError};

const FILL_WGSL: &str = include_str!("shaders/fill.wgsl");
const RESOLVE_WGSL: &str = include_str!("shaders/resolve.wgsl");
const PRESENT_WGSL: &str = include_str!("shaders/present.wgsl");

const QUAD_POSITIONS: [f32; 8] = [
    -1.0, -1.0, //
    1.0, -1.0, //
    1.0, 1.0, //
    -1.0, 1.0, //
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Full-viewport quad in NDC, position at location 0.
pub(crate) fn build_quad(token: &ContextToken) -> Result<VertexArray, VertexError> {
    let mut quad = VertexArray::new("ocular quad");
    quad.set_attribute(token, 0, 2, &QUAD_POSITIONS)?;
    quad.set_indices(token, &QUAD_INDICES);
    Ok(quad)
}

fn acquire(
    token: &ContextToken,
    label: &str,
    desc: ProgramDesc<'_>,
) -> Result<Shared, ProgramError> {
    token
        .gpu()
        .shaders()
        .acquire(label, || ShaderProgram::new(token, &desc))
}

fn create_uniform(token: &ContextToken, label: &str, size: usize) -> wgpu::Buffer {
    token.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

// ── fill ──────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FillUniform {
    color: [f32; 4],
}

/// Writes the background color and "nothing" to every pixel of the bound
/// attachments.
pub(crate) struct FillPass {
    program: Shared,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl FillPass {
    pub(crate) fn new(
        token: &ContextToken,
        quad: &VertexArray,
        sample_count: u32,
    ) -> Result<Self, ProgramError> {
        let label = format!("ocular.fill@x{sample_count}");
        let layouts = quad.layouts();
        let targets = color_targets(None);

        let program = acquire(
            token,
            &label,
            ProgramDesc {
                vertex_buffers: &layouts,
                targets: &targets,
                depth_stencil: Some(depth_state(false, wgpu::CompareFunction::Always)),
                sample_count,
                ..ProgramDesc::new(&label, FILL_WGSL)
            },
        )?;

        let uniform = create_uniform(token, "ocular fill ubo", size_of::<FillUniform>());
        let bind_group = token.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ocular fill bind group"),
            layout: &program.bind_group_layout(0),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });

        Ok(Self { program, uniform, bind_group })
    }

    pub(crate) fn sample_count(&self) -> u32 {
        self.program.sample_count()
    }

    pub(crate) fn draw(
        &self,
        token: &ContextToken,
        pass: &mut wgpu::RenderPass<'_>,
        quad: &VertexArray,
        background: Color,
    ) {
        let u = FillUniform { color: background.to_array() };
        token.queue().write_buffer(&self.uniform, 0, bytemuck::bytes_of(&u));

        pass.set_pipeline(self.program.pipeline());
        pass.set_bind_group(0, &self.bind_group, &[]);
        quad.draw(pass, 0..1);
    }

    pub(crate) fn release(self, gpu: &GpuContext) {
        gpu.shaders().release(self.program);
    }
}

// ── resolve ───────────────────────────────────────────────────────────────

/// Box-filters multisampled color and copies pick subsample 0 into a
/// single-sampled target.
pub(crate) struct ResolvePass {
    program: Shared,
}

impl ResolvePass {
    pub(crate) fn new(token: &ContextToken, quad: &VertexArray) -> Result<Self, ProgramError> {
        let label = "ocular.resolve";
        let layouts = quad.layouts();
        let targets = color_targets(None);

        let program = acquire(
            token,
            label,
            ProgramDesc {
                vertex_buffers: &layouts,
                targets: &targets,
                ..ProgramDesc::new(label, RESOLVE_WGSL)
            },
        )?;

        Ok(Self { program })
    }

    /// Records the resolve of `src` (multisampled) into `dst`.
    ///
    /// Does nothing when either target was closed.
    pub(crate) fn record(
        &self,
        token: &ContextToken,
        encoder: &mut wgpu::CommandEncoder,
        src: &RenderTarget,
        dst: &RenderTarget,
        quad: &VertexArray,
    ) {
        let (Some(src_color), Some(src_pick)) = (src.color_view(), src.pick_view()) else {
            return;
        };
        let (Some(dst_color), Some(dst_pick)) = (dst.color_view(), dst.pick_view()) else {
            return;
        };

        let bind_group = token.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ocular resolve bind group"),
            layout: &self.program.bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(src_color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(src_pick),
                },
            ],
        });

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ocular resolve pass"),
            color_attachments: &[
                Some(overwrite_attachment(dst_color)),
                Some(overwrite_attachment(dst_pick)),
            ],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(self.program.pipeline());
        rpass.set_bind_group(0, &bind_group, &[]);
        quad.draw(&mut rpass, 0..1);
    }

    pub(crate) fn release(self, gpu: &GpuContext) {
        gpu.shaders().release(self.program);
    }
}

fn overwrite_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassColorAttachment<'_> {
    wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
    }
}

// ── present ───────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct BlitUniform {
    src_size: [f32; 2],
    dst_size: [f32; 2],
}

/// Clears the presentation frame and copies the resolved color attachment
/// into it, nearest-neighbour.
pub(crate) struct PresentPass {
    program: Shared,
    format: wgpu::TextureFormat,
    uniform: wgpu::Buffer,
}

impl PresentPass {
    pub(crate) fn new(
        token: &ContextToken,
        quad: &VertexArray,
        format: wgpu::TextureFormat,
    ) -> Result<Self, ProgramError> {
        let label = format!("ocular.present@{format:?}");
        let layouts = quad.layouts();
        let targets = [Some(wgpu::ColorTargetState {
            format,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let program = acquire(
            token,
            &label,
            ProgramDesc {
                vertex_buffers: &layouts,
                targets: &targets,
                ..ProgramDesc::new(&label, PRESENT_WGSL)
            },
        )?;

        let uniform = create_uniform(token, "ocular present ubo", size_of::<BlitUniform>());
        Ok(Self { program, format, uniform })
    }

    pub(crate) fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn record(
        &self,
        token: &ContextToken,
        encoder: &mut wgpu::CommandEncoder,
        src: &RenderTarget,
        dst: &wgpu::TextureView,
        dst_size: PixelSize,
        clear: Color,
        quad: &VertexArray,
    ) {
        let u = BlitUniform {
            src_size: [src.width() as f32, src.height() as f32],
            dst_size: [dst_size.width.max(1) as f32, dst_size.height.max(1) as f32],
        };
        token.queue().write_buffer(&self.uniform, 0, bytemuck::bytes_of(&u));

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ocular present pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: dst,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some(src_color) = src.color_view() else { return };

        let bind_group = token.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ocular present bind group"),
            layout: &self.program.bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(src_color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.uniform.as_entire_binding(),
                },
            ],
        });

        rpass.set_pipeline(self.program.pipeline());
        rpass.set_bind_group(0, &bind_group, &[]);
        quad.draw(&mut rpass, 0..1);
    }

    pub(crate) fn release(self, gpu: &GpuContext) {
        gpu.shaders().release(self.program);
    }
}

use std::fmt::Write as _;

use thiserror::Error;

use crate::context::ContextToken;
use crate::device::error_scope;

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

/// WGSL source and entry point of one stage.
#[derive(Debug, Copy, Clone)]
pub struct StageSource<'a> {
    pub source: &'a str,
    pub entry_point: &'a str,
}

impl<'a> StageSource<'a> {
    pub const fn new(source: &'a str, entry_point: &'a str) -> Self {
        Self { source, entry_point }
    }
}

/// Everything needed to build a [`ShaderProgram`].
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex: StageSource<'a>,
    /// Accepted for interface parity; this backend has no geometry stage and
    /// rejects any program that supplies one.
    pub geometry: Option<StageSource<'a>>,
    pub fragment: StageSource<'a>,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub targets: &'a [Option<wgpu::ColorTargetState>],
    pub depth_stencil: Option<wgpu::DepthStencilState>,
    pub sample_count: u32,
    /// Bit `i` enables writes to sample `i`.
    pub sample_mask: u64,
    pub topology: wgpu::PrimitiveTopology,
}

impl<'a> ProgramDesc<'a> {
    /// Single-source program with `vs_main`/`fs_main` entry points, no vertex
    /// buffers, no targets and one sample. Override fields as needed.
    pub fn new(label: &'a str, source: &'a str) -> Self {
        Self {
            label,
            vertex: StageSource::new(source, "vs_main"),
            geometry: None,
            fragment: StageSource::new(source, "fs_main"),
            vertex_buffers: &[],
            targets: &[],
            depth_stencil: None,
            sample_count: 1,
            sample_mask: !0,
            topology: wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProgramError {
    /// A stage failed to compile. `code` is the offending source.
    #[error("{label}: {stage:?} stage failed to compile:\n{diagnostics}")]
    Compile {
        label: String,
        stage: ShaderStage,
        diagnostics: String,
        code: String,
    },

    #[error("{label}: program failed to link:\n{diagnostics}")]
    Link { label: String, diagnostics: String },

    #[error("{label}: {stage:?} stage is not supported by this backend")]
    UnsupportedStage { label: String, stage: ShaderStage },
}

/// Compiled and linked GPU program.
///
/// Owns its shader modules and render pipeline. Construction either fully
/// succeeds or returns an error having released everything it created.
pub struct ShaderProgram {
    label: String,
    sample_count: u32,
    pipeline: wgpu::RenderPipeline,
    _modules: Vec<wgpu::ShaderModule>,
}

impl ShaderProgram {
    pub fn new(token: &ContextToken, desc: &ProgramDesc<'_>) -> Result<Self, ProgramError> {
        if desc.geometry.is_some() {
            return Err(ProgramError::UnsupportedStage {
                label: desc.label.to_string(),
                stage: ShaderStage::Geometry,
            });
        }

        let device = token.device();

        let vertex_module = compile(device, desc.label, ShaderStage::Vertex, desc.vertex.source)?;
        let fragment_module = if desc.fragment.source == desc.vertex.source {
            None
        } else {
            Some(compile(device, desc.label, ShaderStage::Fragment, desc.fragment.source)?)
        };
        let fs_module = fragment_module.as_ref().unwrap_or(&vertex_module);

        let (pipeline, err) = error_scope::capture(device, || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                // Bind group layouts are derived from the shader.
                layout: None,
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some(desc.vertex.entry_point),
                    compilation_options: Default::default(),
                    buffers: desc.vertex_buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: fs_module,
                    entry_point: Some(desc.fragment.entry_point),
                    compilation_options: Default::default(),
                    targets: desc.targets,
                }),
                primitive: wgpu::PrimitiveState {
                    topology: desc.topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: desc.depth_stencil.clone(),
                multisample: wgpu::MultisampleState {
                    count: desc.sample_count,
                    mask: desc.sample_mask,
                    alpha_to_coverage_enabled: false,
                },
                multiview_mask: None,
                cache: None,
            })
        });

        if let Some(err) = err {
            log::error!("{}: link failed: {err}", desc.label);
            return Err(ProgramError::Link {
                label: desc.label.to_string(),
                diagnostics: err.to_string(),
            });
        }

        log::debug!("program {} built @{}x", desc.label, desc.sample_count);

        let mut modules = vec![vertex_module];
        modules.extend(fragment_module);

        Ok(Self {
            label: desc.label.to_string(),
            sample_count: desc.sample_count,
            pipeline,
            _modules: modules,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Bind group layout `index` as derived from the shader source.
    pub fn bind_group_layout(&self, index: u32) -> wgpu::BindGroupLayout {
        self.pipeline.get_bind_group_layout(index)
    }
}

fn compile(
    device: &wgpu::Device,
    label: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<wgpu::ShaderModule, ProgramError> {
    let (module, err) = error_scope::capture(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    });

    let Some(err) = err else {
        return Ok(module);
    };

    let info = pollster::block_on(module.get_compilation_info());
    let mut diagnostics = String::new();
    for msg in info
        .messages
        .iter()
        .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
    {
        match &msg.location {
            Some(loc) => {
                let _ = writeln!(
                    diagnostics,
                    "{}:{}: {}",
                    loc.line_number, loc.line_position, msg.message
                );
            }
            None => {
                let _ = writeln!(diagnostics, "{}", msg.message);
            }
        }
    }
    if diagnostics.is_empty() {
        diagnostics = err.to_string();
    }

    log::error!("{label}: {stage:?} compile failed:\n{diagnostics}");

    Err(ProgramError::Compile {
        label: label.to_string(),
        stage,
        diagnostics,
        code: source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_message_carries_label_and_stage() {
        let err = ProgramError::Compile {
            label: "ocular.fill".into(),
            stage: ShaderStage::Fragment,
            diagnostics: "3:5: unknown identifier `colr`".into(),
            code: "...".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("ocular.fill: Fragment stage failed to compile"));
        assert!(msg.contains("unknown identifier"));
    }

    #[test]
    fn default_desc_uses_one_source_for_both_stages() {
        let desc = ProgramDesc::new("p", "src");
        assert_eq!(desc.vertex.source, desc.fragment.source);
        assert_eq!(desc.vertex.entry_point, "vs_main");
        assert_eq!(desc.fragment.entry_point, "fs_main");
        assert_eq!(desc.sample_count, 1);
        assert!(desc.geometry.is_none());
    }
}

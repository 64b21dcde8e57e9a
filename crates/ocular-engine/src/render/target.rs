use std::fmt;

use thiserror::Error;

use crate::context::ContextToken;
use crate::coords::PixelSize;
use crate::device::error_scope;

/// Format of the visible color attachment.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Format of the pick attachment. Unorm with 8 bits per channel so every id
/// byte is stored exactly.
pub const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Format of the depth attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Depth state for pipelines drawing into a canvas frame pass.
///
/// Depth is attached for callers that need it; the canvas's own programs test
/// against nothing and write nothing.
pub fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Color target states `[color, pick]` for a frame pass.
///
/// The pick attachment never blends: a blended id is an id of no object.
pub fn color_targets(color_blend: Option<wgpu::BlendState>) -> [Option<wgpu::ColorTargetState>; 2] {
    [
        Some(wgpu::ColorTargetState {
            format: COLOR_FORMAT,
            blend: color_blend,
            write_mask: wgpu::ColorWrites::ALL,
        }),
        Some(wgpu::ColorTargetState {
            format: PICK_FORMAT,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        }),
    ]
}

/// Why a render target could not be made usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completeness {
    /// Width or height exceeds the device texture limit.
    IncompleteDimensions { width: u32, height: u32, max: u32 },
    /// The device cannot multisample the attachment formats at this count.
    IncompleteMultisample { samples: u32 },
    /// Attachment creation failed on the device.
    IncompleteAttachment(String),
}

impl fmt::Display for Completeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completeness::IncompleteDimensions { width, height, max } => {
                write!(f, "IncompleteDimensions ({width}x{height} exceeds {max})")
            }
            Completeness::IncompleteMultisample { samples } => {
                write!(f, "IncompleteMultisample ({samples}x not supported)")
            }
            Completeness::IncompleteAttachment(reason) => {
                write!(f, "IncompleteAttachment ({reason})")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum TargetError {
    /// Rejected before touching the GPU.
    #[error("render target size {}x{} is empty", .0.width, .0.height)]
    ZeroSize(PixelSize),

    #[error("unsupported sample count {0}; expected 1, 2 or 4")]
    InvalidSampleCount(u32),

    #[error("render target incomplete: {0}")]
    Incomplete(Completeness),
}

/// Selects one of the two color attachments.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttachmentKind {
    Color,
    Pick,
}

struct Attachment {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Attachment {
    fn create(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        size: PixelSize,
        sample_count: u32,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn destroy(self) {
        drop(self.view);
        self.texture.destroy();
    }
}

/// Off-screen destination with three attachments: visible color, pick ids and
/// depth. Either all three are single-sampled or all share one sample count.
///
/// `close()` destroys the textures immediately and is idempotent; dropping a
/// target closes it.
pub struct RenderTarget {
    size: PixelSize,
    sample_count: u32,
    color: Option<Attachment>,
    pick: Option<Attachment>,
    depth: Option<Attachment>,
}

impl RenderTarget {
    /// Allocates and validates a render target.
    ///
    /// `sample_count` is `1` for a plain target or `2`/`4` for a multisampled
    /// one. Empty sizes are rejected before any GPU call.
    pub fn new(
        token: &ContextToken,
        size: PixelSize,
        sample_count: u32,
    ) -> Result<Self, TargetError> {
        if size.is_empty() {
            return Err(TargetError::ZeroSize(size));
        }
        if !matches!(sample_count, 1 | 2 | 4) {
            return Err(TargetError::InvalidSampleCount(sample_count));
        }

        let caps = token.gpu().caps();
        if size.width > caps.max_texture_dimension || size.height > caps.max_texture_dimension {
            return Err(TargetError::Incomplete(Completeness::IncompleteDimensions {
                width: size.width,
                height: size.height,
                max: caps.max_texture_dimension,
            }));
        }
        if sample_count > 1 && caps.effective_samples(sample_count) != sample_count {
            return Err(TargetError::Incomplete(Completeness::IncompleteMultisample {
                samples: sample_count,
            }));
        }

        let device = token.device();
        let multisampled = sample_count > 1;

        // Multisampled attachments are only ever sampled by the resolve pass;
        // single-sampled ones are also presented and read back.
        let color_usage = if multisampled {
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING
        } else {
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
        };

        let ((color, pick, depth), err) = error_scope::capture(device, || {
            let color = Attachment::create(
                device,
                "ocular target color",
                COLOR_FORMAT,
                size,
                sample_count,
                color_usage,
            );
            let pick = Attachment::create(
                device,
                "ocular target pick",
                PICK_FORMAT,
                size,
                sample_count,
                color_usage,
            );
            let depth = Attachment::create(
                device,
                "ocular target depth",
                DEPTH_FORMAT,
                size,
                sample_count,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            );
            (color, pick, depth)
        });

        if let Some(err) = err {
            color.destroy();
            pick.destroy();
            depth.destroy();
            return Err(TargetError::Incomplete(Completeness::IncompleteAttachment(
                err.to_string(),
            )));
        }

        log::debug!(
            "render target allocated: {}x{} @{}x",
            size.width,
            size.height,
            sample_count
        );

        Ok(Self {
            size,
            sample_count,
            color: Some(color),
            pick: Some(pick),
            depth: Some(depth),
        })
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn is_multisampled(&self) -> bool {
        self.sample_count > 1
    }

    /// `true` once [`close`](Self::close) ran; every accessor returns `None`.
    pub fn is_closed(&self) -> bool {
        self.color.is_none() && self.pick.is_none() && self.depth.is_none()
    }

    pub fn color_view(&self) -> Option<&wgpu::TextureView> {
        self.color.as_ref().map(|a| &a.view)
    }

    pub fn pick_view(&self) -> Option<&wgpu::TextureView> {
        self.pick.as_ref().map(|a| &a.view)
    }

    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref().map(|a| &a.view)
    }

    pub fn view(&self, kind: AttachmentKind) -> Option<&wgpu::TextureView> {
        match kind {
            AttachmentKind::Color => self.color_view(),
            AttachmentKind::Pick => self.pick_view(),
        }
    }

    pub fn texture(&self, kind: AttachmentKind) -> Option<&wgpu::Texture> {
        let attachment = match kind {
            AttachmentKind::Color => self.color.as_ref(),
            AttachmentKind::Pick => self.pick.as_ref(),
        };
        attachment.map(|a| &a.texture)
    }

    /// Destroys all attachments. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        for attachment in [self.color.take(), self.pick.take(), self.depth.take()]
            .into_iter()
            .flatten()
        {
            attachment.destroy();
        }
        log::debug!("render target closed: {}x{}", self.size.width, self.size.height);
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        self.close();
    }
}

use crate::context::ContextToken;
use crate::coords::PixelSize;
use crate::render::target::{COLOR_FORMAT, DEPTH_FORMAT, PICK_FORMAT};

/// The open render pass a draw callback records into.
///
/// Attachment 0 is the visible color, attachment 1 the pick ids; a depth
/// attachment is bound as well. Pipelines drawing here must match
/// [`sample_count`](Self::sample_count) and the formats below; see
/// [`color_targets`](crate::render::target::color_targets) and
/// [`depth_state`](crate::render::target::depth_state).
pub struct FramePass<'p, 't> {
    pass: &'p mut wgpu::RenderPass<'static>,
    token: &'t ContextToken,
    size: PixelSize,
    sample_count: u32,
}

impl<'p, 't> FramePass<'p, 't> {
    pub(crate) fn new(
        pass: &'p mut wgpu::RenderPass<'static>,
        token: &'t ContextToken,
        size: PixelSize,
        sample_count: u32,
    ) -> Self {
        Self { pass, token, size, sample_count }
    }

    pub fn token(&self) -> &'t ContextToken {
        self.token
    }

    pub fn render_pass(&mut self) -> &mut wgpu::RenderPass<'static> {
        self.pass
    }

    /// Target size in pixels.
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

    pub fn color_format(&self) -> wgpu::TextureFormat {
        COLOR_FORMAT
    }

    pub fn pick_format(&self) -> wgpu::TextureFormat {
        PICK_FORMAT
    }

    pub fn depth_format(&self) -> wgpu::TextureFormat {
        DEPTH_FORMAT
    }
}

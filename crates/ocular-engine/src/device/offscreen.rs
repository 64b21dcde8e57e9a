use std::sync::Arc;

use crate::context::ContextToken;
use crate::coords::{PixelRect, PixelSize};
use crate::render::readback::{self, ReadbackError};

use super::{GpuContext, PlatformError, PlatformSurface, PresentFrame};

/// Texture-backed [`PlatformSurface`] for headless rendering and tests.
///
/// Presented frames stay in the texture and can be read back.
pub struct OffscreenSurface {
    gpu: Arc<GpuContext>,
    format: wgpu::TextureFormat,
    size: PixelSize,
    texture: Option<wgpu::Texture>,
}

impl OffscreenSurface {
    pub fn new(gpu: Arc<GpuContext>, size: PixelSize, format: wgpu::TextureFormat) -> Self {
        let mut surface = Self { gpu, format, size: PixelSize::default(), texture: None };
        surface.resize(size);
        surface
    }

    /// Replaces the backing texture; contents are discarded.
    pub fn resize(&mut self, size: PixelSize) {
        if let Some(old) = self.texture.take() {
            old.destroy();
        }
        self.size = size;
        if size.is_empty() {
            return;
        }

        self.texture = Some(self.gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("ocular offscreen present"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        }));
    }

    /// Reads back the whole presented image as tightly packed 4-byte texels.
    pub fn read_pixels(&self, token: &ContextToken) -> Result<Vec<u8>, ReadbackError> {
        let Some(texture) = self.texture.as_ref() else {
            return Ok(Vec::new());
        };
        let region = PixelRect::new(0, 0, self.size.width, self.size.height);
        readback::read_region(token, texture, region)
    }
}

impl PlatformSurface for OffscreenSurface {
    fn size(&self) -> PixelSize {
        self.size
    }

    fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    fn acquire_frame(&mut self, _token: &ContextToken) -> Result<PresentFrame, PlatformError> {
        let Some(texture) = self.texture.as_ref() else {
            return Err(PlatformError::ZeroSize);
        };
        Ok(PresentFrame::offscreen(
            texture.create_view(&wgpu::TextureViewDescriptor::default()),
        ))
    }

    fn present(&mut self, frame: PresentFrame) {
        frame.finish();
    }
}

use crate::context::ContextToken;
use crate::coords::PixelSize;

use super::PlatformError;

/// Presentation capability a canvas renders into.
///
/// Implemented per windowing toolkit (and once for offscreen textures). The
/// canvas holds no reference to the toolkit; it only asks the platform for a
/// frame, draws into its view, and hands it back for presentation.
pub trait PlatformSurface {
    /// Current drawable size in physical pixels.
    fn size(&self) -> PixelSize;

    /// Format of the views handed out by [`acquire_frame`](Self::acquire_frame).
    fn format(&self) -> wgpu::TextureFormat;

    /// Acquires the next frame to draw into.
    fn acquire_frame(&mut self, token: &ContextToken) -> Result<PresentFrame, PlatformError>;

    /// Presents a frame after the commands drawing into it were submitted.
    fn present(&mut self, frame: PresentFrame);
}

/// A single acquired presentation frame.
///
/// Short-lived: holding a swapchain frame prevents acquisition of the next one.
pub struct PresentFrame {
    view: wgpu::TextureView,
    surface_texture: Option<wgpu::SurfaceTexture>,
}

impl PresentFrame {
    pub(crate) fn swapchain(surface_texture: wgpu::SurfaceTexture) -> Self {
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Self { view, surface_texture: Some(surface_texture) }
    }

    pub(crate) fn offscreen(view: wgpu::TextureView) -> Self {
        Self { view, surface_texture: None }
    }

    /// View to render into.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Hands a swapchain frame to the compositor; offscreen frames just drop.
    pub(crate) fn finish(self) {
        let Self { view, surface_texture } = self;
        drop(view);
        if let Some(surface_texture) = surface_texture {
            surface_texture.present();
        }
    }
}

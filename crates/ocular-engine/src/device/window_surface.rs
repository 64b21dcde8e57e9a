use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::SurfaceError;

use crate::context::ContextToken;
use crate::coords::PixelSize;

use super::{GpuContext, GpuInit, PlatformError, PlatformSurface, PresentFrame, SurfaceErrorAction};

/// Window swapchain implementing [`PlatformSurface`].
///
/// The surface borrows the window for `'w`; architecture must ensure the
/// window outlives it.
pub struct WindowSurface<'w> {
    gpu: Arc<GpuContext>,

    /// Surface bound to the window.
    surface: wgpu::Surface<'w>,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: PixelSize,
}

impl<'w> WindowSurface<'w> {
    pub(crate) fn configure(
        gpu: Arc<GpuContext>,
        surface: wgpu::Surface<'w>,
        size: PixelSize,
        init: &GpuInit,
    ) -> Result<Self> {
        let caps = surface.get_capabilities(gpu.adapter());
        let format = choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = choose_alpha_mode(&caps, init.alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        if !size.is_empty() {
            surface.configure(gpu.device(), &config);
        }
        log::debug!("window surface configured: {format:?} {}x{}", size.width, size.height);

        Ok(Self { gpu, surface, config, size })
    }

    /// Reconfigures the swapchain after a resize.
    ///
    /// wgpu does not support configuring a surface with a 0x0 size; in that
    /// case only the stored size is updated and configuration is deferred.
    /// The canvas picks up the new size lazily at the start of its next frame.
    pub fn resize(&mut self, new_size: PixelSize) {
        self.size = new_size;
        if new_size.is_empty() {
            return;
        }

        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(self.gpu.device(), &self.config);
    }

    /// Converts a `SurfaceError` into a higher-level action, reconfiguring
    /// when the swapchain was lost.
    fn handle_surface_error(&mut self, err: &SurfaceError) -> SurfaceErrorAction {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                if !self.size.is_empty() {
                    self.surface.configure(self.gpu.device(), &self.config);
                }
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout | SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

impl PlatformSurface for WindowSurface<'_> {
    fn size(&self) -> PixelSize {
        self.size
    }

    fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn acquire_frame(&mut self, _token: &ContextToken) -> Result<PresentFrame, PlatformError> {
        if self.size.is_empty() {
            return Err(PlatformError::ZeroSize);
        }

        match self.surface.get_current_texture() {
            Ok(surface_texture) => Ok(PresentFrame::swapchain(surface_texture)),
            Err(source) => {
                let action = self.handle_surface_error(&source);
                log::warn!("swapchain frame unavailable ({action:?}): {source}");
                Err(PlatformError::Unavailable { action, source })
            }
        }
    }

    fn present(&mut self, frame: PresentFrame) {
        frame.finish();
    }
}

fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = caps.formats.first().copied()?;

    let preferred: &[wgpu::TextureFormat] = if prefer_srgb {
        &[wgpu::TextureFormat::Bgra8UnormSrgb, wgpu::TextureFormat::Rgba8UnormSrgb]
    } else {
        &[wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Rgba8Unorm]
    };

    preferred
        .iter()
        .copied()
        .find(|f| caps.formats.contains(f))
        .or(Some(first))
}

fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

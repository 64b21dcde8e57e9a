use std::sync::Arc;

use image::RgbaImage;

use crate::context::{ContextToken, SurfaceId};
use crate::coords::{PixelRect, PixelSize};
use crate::device::{GpuContext, PlatformSurface};
use crate::picking::{most_prominent, NOTHING};
use crate::render::passes::{build_quad, FillPass, PresentPass, ResolvePass};
use crate::render::readback::{self, texels_to_argb};
use crate::render::{AttachmentKind, ProgramError, RenderTarget, VertexArray};

use super::{CanvasConfig, CanvasError, FramePass};

/// What a frame call did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Scene rendered (and presented, for `render_frame`).
    Rendered,
    /// Zero-sized canvas; nothing was drawn.
    Skipped,
    /// Scene rendered and queryable, but the platform had no frame to present.
    PresentSkipped,
}

/// Programs and geometry shared by every frame of one canvas.
struct Programs {
    quad: VertexArray,
    fill_ss: FillPass,
    fill_ms: Option<FillPass>,
    resolve: Option<ResolvePass>,
    present: Option<PresentPass>,
}

impl Programs {
    fn fill_for(&self, sample_count: u32) -> &FillPass {
        match &self.fill_ms {
            Some(fill) if fill.sample_count() == sample_count => fill,
            _ => &self.fill_ss,
        }
    }

    fn release(mut self, gpu: &GpuContext) {
        self.fill_ss.release(gpu);
        if let Some(fill) = self.fill_ms.take() {
            fill.release(gpu);
        }
        if let Some(resolve) = self.resolve.take() {
            resolve.release(gpu);
        }
        if let Some(present) = self.present.take() {
            present.release(gpu);
        }
        self.quad.close();
    }
}

/// Off-screen render surface with a parallel pick attachment.
///
/// Frames run strictly one after another (`&mut self`). Render targets are
/// allocated on the first frame and reallocated whenever the frame size
/// changes; pixel queries read the single-sampled target of the last frame.
pub struct Canvas {
    id: SurfaceId,
    gpu: Arc<GpuContext>,
    config: CanvasConfig,
    sample_count: u32,
    size: PixelSize,

    target_ss: Option<RenderTarget>,
    target_ms: Option<RenderTarget>,
    programs: Option<Programs>,

    closed: bool,
}

impl Canvas {
    /// Creates a canvas. No GPU resources are allocated until the first frame.
    pub fn new(gpu: Arc<GpuContext>, config: CanvasConfig, size: PixelSize) -> Self {
        let sample_count = if config.use_msaa {
            gpu.caps().effective_samples(config.max_samples)
        } else {
            1
        };
        let id = SurfaceId::next();
        log::debug!("{id} ({}) created, {sample_count}x samples", config.label);

        Self {
            id,
            gpu,
            config,
            sample_count,
            size,
            target_ss: None,
            target_ms: None,
            programs: None,
            closed: false,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn gpu(&self) -> &Arc<GpuContext> {
        &self.gpu
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Sample count of the drawing target: `1`, or `2`/`4` when multisampling.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Size used by the next off-screen frame.
    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Sets the size of the next frame. Targets are reallocated lazily.
    pub fn resize(&mut self, size: PixelSize) {
        self.size = size;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Makes this canvas's context current on the calling thread.
    pub fn make_current(&self) -> ContextToken {
        ContextToken::acquire(Arc::clone(&self.gpu), self.id)
    }

    /// Renders one frame into the canvas targets without presenting it.
    pub fn render_offscreen<F>(&mut self, draw: F) -> Result<FrameOutcome, CanvasError>
    where
        F: FnOnce(&mut FramePass<'_, '_>),
    {
        self.ensure_open()?;
        let token = self.make_current();

        let size = self.size;
        if size.is_empty() {
            return Ok(FrameOutcome::Skipped);
        }
        self.ensure_resources(&token, size)?;

        let mut encoder = token.device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("ocular frame encoder"),
        });
        self.record_scene(&token, &mut encoder, draw);
        token.queue().submit(std::iter::once(encoder.finish()));

        Ok(FrameOutcome::Rendered)
    }

    /// Renders one frame at the platform's size and presents it.
    ///
    /// A frame the platform cannot hand out (lost or outdated swapchain,
    /// timeout) still renders the scene, so pixel queries stay current.
    pub fn render_frame<P, F>(&mut self, platform: &mut P, draw: F) -> Result<FrameOutcome, CanvasError>
    where
        P: PlatformSurface + ?Sized,
        F: FnOnce(&mut FramePass<'_, '_>),
    {
        self.ensure_open()?;
        let token = self.make_current();

        let size = platform.size();
        self.size = size;
        if size.is_empty() {
            return Ok(FrameOutcome::Skipped);
        }
        self.ensure_resources(&token, size)?;
        self.ensure_present(&token, platform.format())?;

        let mut encoder = token.device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("ocular frame encoder"),
        });
        self.record_scene(&token, &mut encoder, draw);

        let frame = match platform.acquire_frame(&token) {
            Ok(frame) => frame,
            Err(err) if err.is_fatal() => {
                token.queue().submit(std::iter::once(encoder.finish()));
                return Err(err.into());
            }
            Err(err) => {
                log::debug!("{}: present skipped: {err}", self.id);
                token.queue().submit(std::iter::once(encoder.finish()));
                return Ok(FrameOutcome::PresentSkipped);
            }
        };

        if let (Some(programs), Some(target)) = (self.programs.as_ref(), self.target_ss.as_ref()) {
            if let Some(present) = programs.present.as_ref() {
                present.record(
                    &token,
                    &mut encoder,
                    target,
                    frame.view(),
                    size,
                    self.config.screen_clear,
                    &programs.quad,
                );
            }
        }

        token.queue().submit(std::iter::once(encoder.finish()));
        platform.present(frame);
        Ok(FrameOutcome::Rendered)
    }

    /// Value at `(x, y)` of the last frame.
    ///
    /// Reads the pick attachment when `picking`, else the color attachment,
    /// as `0xAARRGGBB`. `window` is the odd side of the square sampled around
    /// the pixel; above 1 the most prominent non-empty value wins (see
    /// [`most_prominent`]). Cells outside the target count as empty, so a
    /// point just off the edge still finds objects within half a window of
    /// it. Queries before the first frame yield [`NOTHING`].
    pub fn query_pixel(&mut self, x: i64, y: i64, picking: bool, window: u32) -> Result<u32, CanvasError> {
        self.ensure_open()?;
        if window == 0 || window % 2 == 0 {
            return Err(CanvasError::InvalidWindow(window));
        }

        let Some(target) = self.target_ss.as_ref() else {
            return Ok(NOTHING);
        };
        let size = target.size();
        let Some(clipped) = PixelRect::centered(x, y, window).clip_to(size) else {
            return Ok(NOTHING);
        };

        let kind = if picking { AttachmentKind::Pick } else { AttachmentKind::Color };
        let Some(texture) = target.texture(kind) else {
            return Err(CanvasError::Closed(self.id));
        };

        let token = self.make_current();
        let mut texels = texels_to_argb(&readback::read_region(&token, texture, clipped)?);

        // Empty cells are never elected, so the cells clipped away need no
        // stand-ins.
        let center = if size.contains(x, y) {
            let offset = (y - clipped.y) as usize * clipped.width as usize + (x - clipped.x) as usize;
            texels.get(offset).copied().unwrap_or(NOTHING)
        } else {
            NOTHING
        };
        if window == 1 {
            return Ok(center);
        }
        Ok(most_prominent(&mut texels, center, NOTHING))
    }

    /// Color attachment of the last frame at full resolution.
    ///
    /// Pixels are premultiplied, as stored. `None` before the first frame.
    pub fn snapshot(&mut self) -> Result<Option<RgbaImage>, CanvasError> {
        self.ensure_open()?;
        let Some(target) = self.target_ss.as_ref() else {
            return Ok(None);
        };
        let Some(texture) = target.texture(AttachmentKind::Color) else {
            return Ok(None);
        };

        let token = self.make_current();
        let size = target.size();
        let bytes = readback::read_region(
            &token,
            texture,
            PixelRect::new(0, 0, size.width, size.height),
        )?;
        Ok(RgbaImage::from_raw(size.width, size.height, bytes))
    }

    /// Releases every GPU resource. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(mut target) = self.target_ms.take() {
            target.close();
        }
        if let Some(mut target) = self.target_ss.take() {
            target.close();
        }
        if let Some(programs) = self.programs.take() {
            programs.release(&self.gpu);
        }
        log::debug!("{} closed", self.id);
    }

    fn ensure_open(&self) -> Result<(), CanvasError> {
        if self.closed {
            return Err(CanvasError::Closed(self.id));
        }
        Ok(())
    }

    fn ensure_resources(&mut self, token: &ContextToken, size: PixelSize) -> Result<(), CanvasError> {
        if self.programs.is_none() {
            self.programs = Some(self.build_programs(token)?);
        }

        if self.target_ss.as_ref().is_some_and(|t| t.size() == size) {
            return Ok(());
        }

        if let Some(mut old) = self.target_ms.take() {
            old.close();
        }
        if let Some(mut old) = self.target_ss.take() {
            old.close();
        }

        let target_ss = RenderTarget::new(token, size, 1)?;
        if self.sample_count > 1 {
            self.target_ms = Some(RenderTarget::new(token, size, self.sample_count)?);
        }
        self.target_ss = Some(target_ss);
        log::debug!("{}: targets sized {}x{}", self.id, size.width, size.height);
        Ok(())
    }

    fn build_programs(&self, token: &ContextToken) -> Result<Programs, CanvasError> {
        let mut quad = build_quad(token)?;
        match self.build_passes(token, &quad) {
            Ok((fill_ss, fill_ms, resolve)) => {
                Ok(Programs { quad, fill_ss, fill_ms, resolve, present: None })
            }
            Err(err) => {
                quad.close();
                Err(err.into())
            }
        }
    }

    /// Builds the fill programs, and the resolve program when multisampling.
    /// On failure everything already acquired is returned to the cache.
    fn build_passes(
        &self,
        token: &ContextToken,
        quad: &VertexArray,
    ) -> Result<(FillPass, Option<FillPass>, Option<ResolvePass>), ProgramError> {
        let fill_ss = FillPass::new(token, quad, 1)?;
        if self.sample_count == 1 {
            return Ok((fill_ss, None, None));
        }

        let fill_ms = match FillPass::new(token, quad, self.sample_count) {
            Ok(fill) => fill,
            Err(err) => {
                fill_ss.release(&self.gpu);
                return Err(err);
            }
        };
        match ResolvePass::new(token, quad) {
            Ok(resolve) => Ok((fill_ss, Some(fill_ms), Some(resolve))),
            Err(err) => {
                fill_ss.release(&self.gpu);
                fill_ms.release(&self.gpu);
                Err(err)
            }
        }
    }

    fn ensure_present(&mut self, token: &ContextToken, format: wgpu::TextureFormat) -> Result<(), CanvasError> {
        let Some(programs) = self.programs.as_mut() else {
            return Ok(());
        };
        if programs.present.as_ref().is_some_and(|p| p.format() == format) {
            return Ok(());
        }
        if let Some(old) = programs.present.take() {
            old.release(&self.gpu);
        }
        programs.present = Some(PresentPass::new(token, &programs.quad, format)?);
        Ok(())
    }

    /// Steps 3 to 6 of a frame: fill, caller draw, resolve.
    fn record_scene<F>(&self, token: &ContextToken, encoder: &mut wgpu::CommandEncoder, draw: F)
    where
        F: FnOnce(&mut FramePass<'_, '_>),
    {
        let Some(programs) = self.programs.as_ref() else { return };
        let Some(target_ss) = self.target_ss.as_ref() else { return };
        let target = self.target_ms.as_ref().unwrap_or(target_ss);

        let (Some(color), Some(pick), Some(depth)) =
            (target.color_view(), target.pick_view(), target.depth_view())
        else {
            return;
        };

        {
            let mut rpass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("ocular scene pass"),
                    color_attachments: &[
                        Some(clear_attachment(color)),
                        Some(clear_attachment(pick)),
                    ],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: depth,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Discard,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                })
                .forget_lifetime();

            programs
                .fill_for(target.sample_count())
                .draw(token, &mut rpass, &programs.quad, self.config.background);

            let mut frame = FramePass::new(&mut rpass, token, target.size(), target.sample_count());
            draw(&mut frame);
        }

        if target.is_multisampled() {
            if let Some(resolve) = programs.resolve.as_ref() {
                resolve.record(token, encoder, target, target_ss, &programs.quad);
            }
        }
    }
}

impl Drop for Canvas {
    fn drop(&mut self) {
        self.close();
    }
}

fn clear_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassColorAttachment<'_> {
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

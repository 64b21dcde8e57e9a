use winit::dpi::PhysicalPosition;
use winit::window::Window;

use crate::canvas::{Canvas, CanvasError, FramePass};
use crate::coords::PixelSize;
use crate::device::WindowSurface;
use crate::picking::NOTHING;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window borrow carried by `WindowSurface<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub surface: &'a mut WindowSurface<'w>,
    pub canvas: &'a mut Canvas,
    /// Last cursor position in physical pixels, `None` outside the window.
    pub cursor: Option<PhysicalPosition<f64>>,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Drawable size in physical pixels.
    pub fn size(&self) -> PixelSize {
        let size = self.window.inner_size();
        PixelSize::new(size.width, size.height)
    }

    /// Renders the canvas with `draw` and presents it to the window.
    ///
    /// Returns [`AppControl::Exit`] only when the surface is unusable.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&mut FramePass<'_, '_>),
    {
        self.window.pre_present_notify();

        match self.canvas.render_frame(&mut *self.surface, draw) {
            Ok(_) => AppControl::Continue,
            Err(CanvasError::Platform(err)) if err.is_fatal() => {
                log::error!("presentation failed: {err}");
                AppControl::Exit
            }
            Err(err) => {
                log::error!("frame failed: {err}");
                AppControl::Continue
            }
        }
    }

    /// Pick id under the cursor, if any.
    ///
    /// `window` is the odd side of the sampled square; see
    /// [`Canvas::query_pixel`].
    pub fn pick_under_cursor(&mut self, window: u32) -> Option<u32> {
        let pos = self.cursor?;
        match self.canvas.query_pixel(pos.x as i64, pos.y as i64, true, window) {
            Ok(NOTHING) => None,
            Ok(id) => Some(id),
            Err(err) => {
                log::warn!("pick query failed: {err}");
                None
            }
        }
    }
}

//! Coordinate and geometry types shared by the canvas and renderers.
//!
//! Canonical space:
//! - physical pixels of the render target
//! - origin top-left
//! - +X right, +Y down
//!
//! Renderers convert to NDC in shaders using a viewport uniform.

mod pixel;
mod rect;

pub use pixel::{PixelRect, PixelSize};
pub use rect::Rect;

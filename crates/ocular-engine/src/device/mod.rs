//! GPU device, capability probing and presentation surfaces.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue (`GpuContext`)
//! - probing multisample support for the canvas attachment formats
//! - the `PlatformSurface` capability that canvases present into, with a
//!   window swapchain and an offscreen texture implementation

mod caps;
mod context;
mod error;
pub(crate) mod error_scope;
mod init;
mod offscreen;
mod platform;
mod window_surface;

pub use caps::{GpuCaps, SUPPORTED_SAMPLE_COUNTS};
pub use context::GpuContext;
pub use error::{PlatformError, SurfaceErrorAction};
pub use init::GpuInit;
pub use offscreen::OffscreenSurface;
pub use platform::{PlatformSurface, PresentFrame};
pub use window_surface::WindowSurface;

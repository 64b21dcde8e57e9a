//! Canvas: the per-frame orchestrator.
//!
//! A canvas owns its render targets and the fill/resolve/present programs,
//! runs one frame at a time (fill, caller draw, resolve, present) and answers
//! pixel queries against the last rendered frame.

mod canvas;
mod config;
mod error;
mod frame;
mod host;

pub use canvas::{Canvas, FrameOutcome};
pub use config::CanvasConfig;
pub use error::{CanvasError, HostError};
pub use frame::FramePass;
pub use host::CanvasHost;

//! Core engine-facing contracts.
//!
//! The interface between the window runtime and applications: per-frame
//! context with the window's canvas and presentation surface.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;

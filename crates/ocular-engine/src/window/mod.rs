//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the window, and wires them to a canvas
//! presenting into the window's swapchain.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};

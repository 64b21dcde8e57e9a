//! Ocular engine crate.
//!
//! Off-screen render targets with a parallel picking attachment, the manual
//! multisample resolve path, pixel queries, and the bookkeeping that keeps GPU
//! resources paired with the canvas that owns them.

pub mod canvas;
pub mod context;
pub mod coords;
pub mod core;
pub mod device;
pub mod logging;
pub mod paint;
pub mod picking;
pub mod render;
pub mod window;

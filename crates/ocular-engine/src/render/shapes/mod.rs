//! Pickable primitives drawn from canvas draw callbacks.

mod common;

pub mod rect;

pub use rect::{PickRect, PickRectRenderer};

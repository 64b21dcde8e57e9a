//! Object picking.
//!
//! Pickable primitives write an opaque id color into the pick attachment next
//! to their visible color. A pixel query reads that attachment back and the
//! registry maps the id to the application object.
//!
//! Encoding: big-endian ARGB `u32`, alpha fixed to `0xFF`; `0` means nothing.

mod allocator;
mod encoding;
mod prominent;
mod registry;

pub use allocator::PickIdAllocator;
pub use encoding::{argb_from_rgba8, id_to_color, pick_key, ALPHA_MASK, KEY_MASK, NOTHING};
pub use prominent::{most_prominent, CENTER_BONUS};
pub use registry::{PickError, PickRegistry, FIRST_ID};

//! Paint model shared between the canvas and renderers.
//!
//! Colors are stored premultiplied, in the same encoding the color attachment
//! holds (no sRGB conversion happens anywhere in the pipeline).

pub mod color;

pub use color::Color;

use crate::paint::Color;

/// Canvas configuration.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Debug label used for logs.
    pub label: String,

    /// Written to every color pixel before the draw callback runs.
    pub background: Color,

    /// Clear color of the presentation frame, visible where the canvas image
    /// does not cover it.
    pub screen_clear: Color,

    /// Render into a multisampled target and resolve it after drawing.
    pub use_msaa: bool,

    /// Upper bound on the sample count; the device may support less.
    pub max_samples: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            label: "canvas".to_string(),
            background: Color::white(),
            screen_clear: Color::black(),
            use_msaa: true,
            max_samples: 4,
        }
    }
}

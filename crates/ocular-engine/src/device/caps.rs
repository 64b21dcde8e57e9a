use crate::render::target::{COLOR_FORMAT, DEPTH_FORMAT, PICK_FORMAT};

/// Multisample levels the canvas knows how to use, highest first.
pub const SUPPORTED_SAMPLE_COUNTS: [u32; 2] = [4, 2];

/// Capabilities probed once per device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GpuCaps {
    /// Highest entry of [`SUPPORTED_SAMPLE_COUNTS`] that every attachment
    /// format supports, or `1` when multisampling is unavailable.
    pub max_samples: u32,

    /// Largest width/height a render target may have.
    pub max_texture_dimension: u32,

    /// `f64` vertex attributes are available.
    pub vertex_f64: bool,
}

impl GpuCaps {
    pub(crate) fn probe(adapter: &wgpu::Adapter, device: &wgpu::Device) -> Self {
        let features = device.features();
        let adapter_specific =
            features.contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);

        let supports = |format: wgpu::TextureFormat, count: u32| {
            let flags = if adapter_specific {
                adapter.get_texture_format_features(format).flags
            } else {
                format.guaranteed_format_features(features).flags
            };
            flags.sample_count_supported(count)
        };

        let max_samples = SUPPORTED_SAMPLE_COUNTS
            .into_iter()
            .find(|&count| {
                [COLOR_FORMAT, PICK_FORMAT, DEPTH_FORMAT]
                    .into_iter()
                    .all(|format| supports(format, count))
            })
            .unwrap_or(1);

        let caps = Self {
            max_samples,
            max_texture_dimension: device.limits().max_texture_dimension_2d,
            vertex_f64: features.contains(wgpu::Features::VERTEX_ATTRIBUTE_64BIT),
        };
        log::info!(
            "gpu caps: msaa up to {}x, max target {}px, f64 vertices {}",
            caps.max_samples,
            caps.max_texture_dimension,
            caps.vertex_f64
        );
        caps
    }

    /// Sample count a canvas should use given its configured ceiling.
    ///
    /// Returns `1` unless at least 2x is supported by the device.
    pub fn effective_samples(&self, requested_max: u32) -> u32 {
        SUPPORTED_SAMPLE_COUNTS
            .into_iter()
            .find(|&count| count <= requested_max && count <= self.max_samples)
            .unwrap_or(1)
    }
}

#![allow(dead_code)]

use std::sync::Arc;

use ocular_engine::canvas::{Canvas, CanvasConfig};
use ocular_engine::coords::PixelSize;
use ocular_engine::device::{GpuContext, GpuInit};
use ocular_engine::logging::init_test_logging;
use ocular_engine::paint::Color;

/// Headless GPU context, or `None` (logged) when the machine has no adapter.
pub fn gpu() -> Option<Arc<GpuContext>> {
    init_test_logging();
    match pollster::block_on(GpuContext::headless(&GpuInit::default())) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            log::warn!("skipping GPU test: {err:#}");
            None
        }
    }
}

pub fn background() -> Color {
    Color::from_rgba8(10, 10, 10, 255)
}

pub fn canvas(gpu: &Arc<GpuContext>, width: u32, height: u32, use_msaa: bool) -> Canvas {
    let config = CanvasConfig {
        label: "test".to_string(),
        background: background(),
        use_msaa,
        ..CanvasConfig::default()
    };
    Canvas::new(Arc::clone(gpu), config, PixelSize::new(width, height))
}

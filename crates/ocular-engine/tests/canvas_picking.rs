mod common;

use std::sync::Arc;

use ocular_engine::canvas::{Canvas, CanvasConfig, CanvasError, CanvasHost, FrameOutcome};
use ocular_engine::coords::{PixelSize, Rect};
use ocular_engine::device::{OffscreenSurface, PlatformSurface};
use ocular_engine::paint::Color;
use ocular_engine::picking::{PickRegistry, NOTHING};
use ocular_engine::render::shapes::{PickRect, PickRectRenderer};

const QUAD_ID: u32 = 0xFF00_1234;

fn quad() -> PickRect {
    PickRect::new(
        Rect::new(45.0, 45.0, 10.0, 10.0),
        Color::from_rgba8(200, 0, 0, 255),
        QUAD_ID,
    )
}

fn render_quad(canvas: &mut Canvas, renderer: &mut PickRectRenderer) {
    let outcome = canvas
        .render_offscreen(|frame| renderer.render(frame, &[quad()]).expect("rect program"))
        .expect("frame");
    assert_eq!(outcome, FrameOutcome::Rendered);
}

#[test]
fn pick_and_color_queries_after_one_frame() {
    let Some(gpu) = common::gpu() else { return };
    let mut canvas = common::canvas(&gpu, 100, 100, false);
    let mut renderer = PickRectRenderer::new();
    render_quad(&mut canvas, &mut renderer);

    assert_eq!(canvas.query_pixel(50, 50, true, 1).unwrap(), QUAD_ID);
    assert_eq!(canvas.query_pixel(5, 5, true, 1).unwrap(), NOTHING);
    assert_eq!(canvas.query_pixel(50, 50, false, 1).unwrap(), 0xFFC8_0000);
    assert_eq!(canvas.query_pixel(5, 5, false, 1).unwrap(), 0xFF0A_0A0A);

    let mut registry = PickRegistry::new();
    registry.register(QUAD_ID, "quad").unwrap();
    let hit = canvas.query_pixel(50, 50, true, 1).unwrap();
    assert_eq!(registry.lookup(hit), Some(&"quad"));
}

#[test]
fn query_before_first_frame_is_nothing() {
    let Some(gpu) = common::gpu() else { return };
    let mut canvas = common::canvas(&gpu, 100, 100, false);

    assert_eq!(canvas.query_pixel(50, 50, true, 1).unwrap(), NOTHING);
    assert_eq!(canvas.query_pixel(50, 50, false, 5).unwrap(), NOTHING);
}

#[test]
fn windowed_query_prefers_objects_over_background() {
    let Some(gpu) = common::gpu() else { return };
    let mut canvas = common::canvas(&gpu, 100, 100, false);
    let mut renderer = PickRectRenderer::new();
    render_quad(&mut canvas, &mut renderer);

    // One column of the 3x3 window touches the quad.
    assert_eq!(canvas.query_pixel(44, 50, true, 3).unwrap(), QUAD_ID);
    assert_eq!(canvas.query_pixel(40, 50, true, 3).unwrap(), NOTHING);

    // Hanging over the corner: out-of-bounds cells are empty.
    assert_eq!(canvas.query_pixel(0, 0, true, 5).unwrap(), NOTHING);
    assert_eq!(canvas.query_pixel(0, 0, false, 5).unwrap(), 0xFF0A_0A0A);

    assert_eq!(canvas.query_pixel(500, 500, true, 1).unwrap(), NOTHING);
}

#[test]
fn windows_wider_than_the_target_read_only_the_target() {
    let Some(gpu) = common::gpu() else { return };
    let mut canvas = common::canvas(&gpu, 100, 100, false);
    let mut renderer = PickRectRenderer::new();
    render_quad(&mut canvas, &mut renderer);

    assert_eq!(canvas.query_pixel(50, 50, true, u32::MAX).unwrap(), QUAD_ID);
    assert_eq!(canvas.query_pixel(50, 50, false, 301).unwrap(), 0xFF0A_0A0A);
    assert_eq!(canvas.query_pixel(i64::MAX, i64::MIN, true, u32::MAX).unwrap(), NOTHING);
}

#[test]
fn window_centered_off_the_edge_finds_nearby_objects() {
    const EDGE_ID: u32 = 0xFF00_5678;
    let Some(gpu) = common::gpu() else { return };
    let mut canvas = common::canvas(&gpu, 100, 100, false);
    let mut renderer = PickRectRenderer::new();
    let edge = PickRect::new(Rect::new(0.0, 40.0, 5.0, 20.0), Color::from_rgba8(0, 0, 200, 255), EDGE_ID);
    canvas
        .render_offscreen(|frame| renderer.render(frame, &[quad(), edge]).expect("rect program"))
        .expect("frame");

    assert_eq!(canvas.query_pixel(-1, 50, true, 3).unwrap(), EDGE_ID);
    assert_eq!(canvas.query_pixel(-1, 50, true, 1).unwrap(), NOTHING);
    assert_eq!(canvas.query_pixel(-2, 50, true, 3).unwrap(), NOTHING);
}

#[test]
fn even_or_zero_window_is_rejected() {
    let Some(gpu) = common::gpu() else { return };
    let mut canvas = common::canvas(&gpu, 10, 10, false);

    assert!(matches!(canvas.query_pixel(1, 1, true, 0), Err(CanvasError::InvalidWindow(0))));
    assert!(matches!(canvas.query_pixel(1, 1, true, 4), Err(CanvasError::InvalidWindow(4))));
}

#[test]
fn multisampled_canvas_answers_like_single_sampled() {
    let Some(gpu) = common::gpu() else { return };
    let mut canvas = common::canvas(&gpu, 100, 100, true);
    if canvas.sample_count() == 1 {
        log::warn!("skipping: device cannot multisample the canvas formats");
        return;
    }
    let mut renderer = PickRectRenderer::new();
    render_quad(&mut canvas, &mut renderer);

    assert_eq!(canvas.query_pixel(50, 50, true, 1).unwrap(), QUAD_ID);
    assert_eq!(canvas.query_pixel(5, 5, true, 1).unwrap(), NOTHING);
    assert_eq!(canvas.query_pixel(50, 50, false, 1).unwrap(), 0xFFC8_0000);
    assert_eq!(canvas.query_pixel(5, 5, false, 1).unwrap(), 0xFF0A_0A0A);
}

fn assert_argb_near(actual: u32, expected: u32) {
    let close = actual
        .to_be_bytes()
        .iter()
        .zip(expected.to_be_bytes())
        .all(|(&a, e)| a.abs_diff(e) <= 1);
    assert!(close, "got {actual:#010x}, expected {expected:#010x}");
}

#[test]
fn resolve_averages_color_and_keeps_pick_sample_zero() {
    let Some(gpu) = common::gpu() else { return };
    let config = CanvasConfig {
        background: Color::from_rgba8(0, 0, 0, 255),
        ..CanvasConfig::default()
    };
    let mut canvas = Canvas::new(Arc::clone(&gpu), config, PixelSize::new(8, 8));
    if canvas.sample_count() != 4 {
        log::warn!("skipping: 4x multisampling unavailable");
        return;
    }

    // Background B on every sample, then A on a subset of samples.
    let a = Color::from_rgba8(200, 100, 40, 255);
    let everything = PickRect::new(Rect::new(0.0, 0.0, 8.0, 8.0), a, QUAD_ID);

    let mut first_three = PickRectRenderer::new().with_sample_mask(0b0111);
    canvas
        .render_offscreen(|frame| first_three.render(frame, &[everything]).unwrap())
        .unwrap();
    assert_argb_near(canvas.query_pixel(4, 4, false, 1).unwrap(), 0xFF96_4B1E);
    assert_eq!(canvas.query_pixel(4, 4, true, 1).unwrap(), QUAD_ID);

    let mut last_only = PickRectRenderer::new().with_sample_mask(0b1000);
    canvas
        .render_offscreen(|frame| last_only.render(frame, &[everything]).unwrap())
        .unwrap();
    assert_argb_near(canvas.query_pixel(4, 4, false, 1).unwrap(), 0xFF32_190A);
    assert_eq!(canvas.query_pixel(4, 4, true, 1).unwrap(), NOTHING);
}

#[test]
fn presents_into_offscreen_surface() {
    let Some(gpu) = common::gpu() else { return };
    let mut canvas = common::canvas(&gpu, 1, 1, false);
    let mut surface = OffscreenSurface::new(
        Arc::clone(&gpu),
        PixelSize::new(100, 100),
        wgpu::TextureFormat::Rgba8Unorm,
    );
    let mut renderer = PickRectRenderer::new();

    let outcome = canvas
        .render_frame(&mut surface, |frame| renderer.render(frame, &[quad()]).unwrap())
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Rendered);
    // The frame size follows the platform.
    assert_eq!(canvas.size(), surface.size());

    let token = canvas.make_current();
    let pixels = surface.read_pixels(&token).unwrap();
    let at = |x: usize, y: usize| &pixels[(y * 100 + x) * 4..(y * 100 + x) * 4 + 4];
    assert_eq!(at(50, 50), &[200, 0, 0, 255]);
    assert_eq!(at(5, 5), &[10, 10, 10, 255]);
    drop(token);

    assert_eq!(canvas.query_pixel(50, 50, true, 1).unwrap(), QUAD_ID);
}

#[test]
fn zero_sized_platform_skips_the_frame() {
    let Some(gpu) = common::gpu() else { return };
    let mut canvas = common::canvas(&gpu, 100, 100, false);
    let mut surface =
        OffscreenSurface::new(Arc::clone(&gpu), PixelSize::new(0, 0), wgpu::TextureFormat::Rgba8Unorm);

    let mut called = false;
    let outcome = canvas.render_frame(&mut surface, |_| called = true).unwrap();
    assert_eq!(outcome, FrameOutcome::Skipped);
    assert!(!called);
    assert_eq!(canvas.query_pixel(0, 0, true, 1).unwrap(), NOTHING);
}

#[test]
fn snapshot_and_resize() {
    let Some(gpu) = common::gpu() else { return };
    let mut canvas = common::canvas(&gpu, 100, 100, false);
    assert!(canvas.snapshot().unwrap().is_none());

    let mut renderer = PickRectRenderer::new();
    render_quad(&mut canvas, &mut renderer);

    let image = canvas.snapshot().unwrap().expect("rendered frame");
    assert_eq!(image.dimensions(), (100, 100));
    assert_eq!(image.get_pixel(50, 50).0, [200, 0, 0, 255]);
    assert_eq!(image.get_pixel(5, 5).0, [10, 10, 10, 255]);

    canvas.resize(PixelSize::new(40, 30));
    render_quad(&mut canvas, &mut renderer);
    let image = canvas.snapshot().unwrap().expect("rendered frame");
    assert_eq!(image.dimensions(), (40, 30));
    assert_eq!(canvas.query_pixel(50, 50, true, 1).unwrap(), NOTHING);
}

#[test]
fn closed_canvas_rejects_work() {
    let Some(gpu) = common::gpu() else { return };
    let mut canvas = common::canvas(&gpu, 10, 10, false);
    canvas.render_offscreen(|_| {}).unwrap();

    canvas.close();
    canvas.close();
    assert!(canvas.is_closed());
    assert!(matches!(canvas.query_pixel(1, 1, true, 1), Err(CanvasError::Closed(_))));
    assert!(matches!(canvas.render_offscreen(|_| {}), Err(CanvasError::Closed(_))));
}

#[test]
fn host_runs_requests_on_the_canvas_thread() {
    let Some(gpu) = common::gpu() else { return };
    let config = CanvasConfig {
        background: common::background(),
        use_msaa: false,
        ..CanvasConfig::default()
    };
    let host = CanvasHost::spawn(Arc::clone(&gpu), config, PixelSize::new(100, 100)).unwrap();

    let caller = std::thread::current().id();
    let (worker, outcome) = host
        .call(|canvas| {
            let mut renderer = PickRectRenderer::new();
            let outcome = canvas.render_offscreen(|frame| renderer.render(frame, &[quad()]).unwrap());
            (std::thread::current().id(), outcome.map_err(|e| e.to_string()))
        })
        .unwrap();
    assert_ne!(worker, caller);
    assert_eq!(outcome, Ok(FrameOutcome::Rendered));

    let hit = host
        .call(|canvas| canvas.query_pixel(50, 50, true, 1).map_err(|e| e.to_string()))
        .unwrap();
    assert_eq!(hit, Ok(QUAD_ID));

    host.shutdown();
}

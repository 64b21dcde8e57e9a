//! Hover-picking demo: a grid of tiles, each registered as a pickable object.
//! The tile under the cursor is highlighted and its name logged.

use anyhow::Result;

use ocular_engine::canvas::CanvasConfig;
use ocular_engine::coords::Rect;
use ocular_engine::core::{App, AppControl, FrameCtx};
use ocular_engine::device::GpuInit;
use ocular_engine::logging::{init_logging, LoggingConfig};
use ocular_engine::paint::Color;
use ocular_engine::picking::PickRegistry;
use ocular_engine::render::shapes::{PickRect, PickRectRenderer};
use ocular_engine::window::{Runtime, RuntimeConfig};

const COLS: u32 = 8;
const ROWS: u32 = 6;
const GAP: f32 = 6.0;

/// Side of the square sampled around the cursor.
const PICK_WINDOW: u32 = 5;

struct Tile {
    name: String,
    id: u32,
    color: Color,
}

struct Studio {
    tiles: Vec<Tile>,
    registry: PickRegistry<usize>,
    renderer: PickRectRenderer,
    hovered: Option<u32>,
}

impl Studio {
    fn new() -> Result<Self> {
        let mut registry = PickRegistry::new();
        let mut tiles = Vec::new();

        for row in 0..ROWS {
            for col in 0..COLS {
                let index = tiles.len();
                let id = registry.insert(index)?;
                let shade = (row * COLS + col) as f32 / (ROWS * COLS) as f32;
                tiles.push(Tile {
                    name: format!("tile {row}:{col}"),
                    id,
                    color: Color::from_straight(0.2 + 0.6 * shade, 0.35, 0.8 - 0.5 * shade, 1.0),
                });
            }
        }

        Ok(Self { tiles, registry, renderer: PickRectRenderer::new(), hovered: None })
    }

    fn layout(&self, width: u32, height: u32) -> Vec<PickRect> {
        let cell_w = width as f32 / COLS as f32;
        let cell_h = height as f32 / ROWS as f32;

        self.tiles
            .iter()
            .enumerate()
            .map(|(i, tile)| {
                let col = i as u32 % COLS;
                let row = i as u32 / COLS;
                let color = if self.hovered == Some(tile.id) { Color::white() } else { tile.color };
                PickRect::new(
                    Rect::new(
                        col as f32 * cell_w + GAP,
                        row as f32 * cell_h + GAP,
                        cell_w - 2.0 * GAP,
                        cell_h - 2.0 * GAP,
                    ),
                    color,
                    tile.id,
                )
            })
            .collect()
    }
}

impl App for Studio {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let hovered = ctx.pick_under_cursor(PICK_WINDOW);
        if hovered != self.hovered {
            if let Some(tile) = hovered.and_then(|id| self.registry.lookup(id)).map(|&i| &self.tiles[i]) {
                log::info!("hovering {}", tile.name);
            }
            self.hovered = hovered;
        }

        let size = ctx.size();
        let rects = self.layout(size.width, size.height);
        let renderer = &mut self.renderer;

        ctx.render(|frame| {
            if let Err(err) = renderer.render(frame, &rects) {
                log::error!("tile pass failed: {err}");
            }
        })
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Ocular Studio".to_string(),
        canvas: CanvasConfig {
            label: "studio".to_string(),
            background: Color::from_rgba8(24, 24, 28, 255),
            ..CanvasConfig::default()
        },
        ..RuntimeConfig::default()
    };

    Runtime::run(config, GpuInit::default(), Studio::new()?)
}

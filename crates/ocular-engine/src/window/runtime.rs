use std::sync::Arc;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::canvas::{Canvas, CanvasConfig};
use crate::coords::PixelSize;
use crate::core::{App as CoreApp, AppControl, FrameCtx};
use crate::device::{GpuContext, GpuInit, WindowSurface};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub canvas: CanvasConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "ocular".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            canvas: CanvasConfig::default(),
        }
    }
}

/// Runtime context passed to the application.
///
/// Requests are applied after the current callback returns.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    exit: bool,
}

impl RuntimeCtx {
    pub fn exit(&mut self) {
        self.exit = true;
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    surface: WindowSurface<'this>,
}

struct WindowState {
    entry: WindowEntry,
    canvas: Canvas,
    cursor: Option<PhysicalPosition<f64>>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    gpu: Option<Arc<GpuContext>>,
    window: Option<WindowState>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            gpu: None,
            window: None,
            exit_requested: false,
        }
    }

    fn create_window_state(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowState> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = &self.gpu_init;
        let shared = self.gpu.clone();
        let mut created = None;

        let entry = WindowEntryTryBuilder {
            window,
            surface_builder: |w| match &shared {
                Some(gpu) => gpu.create_window_surface(w, gpu_init),
                None => pollster::block_on(GpuContext::for_window(w, gpu_init)).map(
                    |(gpu, surface)| {
                        created = Some(gpu);
                        surface
                    },
                ),
            },
        }
        .try_build()?;

        let gpu = created
            .or(shared)
            .context("window surface built without a GPU context")?;
        self.gpu = Some(Arc::clone(&gpu));

        let size = entry.with_window(|w| w.inner_size());
        let canvas = Canvas::new(
            gpu,
            self.config.canvas.clone(),
            PixelSize::new(size.width, size.height),
        );

        Ok(WindowState { entry, canvas, cursor: None })
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        // Close the canvas before its surface and window go away.
        if let Some(mut state) = self.window.take() {
            state.canvas.close();
        }
        event_loop.exit();
    }

    fn redraw(&mut self) -> RuntimeCtx {
        let mut runtime = RuntimeCtx::default();
        let (app, window) = (&mut self.app, &mut self.window);
        let Some(WindowState { entry, canvas, cursor }) = window.as_mut() else {
            return runtime;
        };

        let control = entry.with_mut(|fields| {
            let mut ctx = FrameCtx {
                window: fields.window,
                surface: fields.surface,
                canvas,
                cursor: *cursor,
                runtime: &mut runtime,
            };
            app.on_frame(&mut ctx)
        });

        if control == AppControl::Exit {
            runtime.exit();
        }
        runtime
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        match self.create_window_state(event_loop) {
            Ok(state) => {
                state.entry.with_window(|w| w.request_redraw());
                self.window = Some(state);
            }
            Err(e) => {
                log::error!("failed to create window: {e:#}");
                self.request_exit(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw keeps hover picking live.
        if let Some(state) = self.window.as_ref() {
            state.entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(state) = self.window.as_mut() else { return };
        if state.entry.with_window(|w| w.id()) != window_id {
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            WindowEvent::Resized(new_size) => {
                let size = PixelSize::new(new_size.width, new_size.height);
                state.entry.with_surface_mut(|surface| surface.resize(size));
                state.entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = state.entry.with_window(|w| w.inner_size());
                let size = PixelSize::new(new_size.width, new_size.height);
                state.entry.with_surface_mut(|surface| surface.resize(size));
                state.entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::CursorMoved { position, .. } => state.cursor = Some(*position),

            WindowEvent::CursorLeft { .. } => state.cursor = None,

            WindowEvent::RedrawRequested => {
                let runtime = self.redraw();
                if runtime.exit {
                    self.request_exit(event_loop);
                }
            }

            _ => {}
        }
    }
}

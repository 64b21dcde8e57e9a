use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use winit::window::Window;

use crate::coords::PixelSize;
use crate::render::ShaderCache;

use super::{GpuCaps, GpuInit, WindowSurface};

/// Owns wgpu core objects shared by every canvas of one context family.
///
/// - creates and stores Instance/Adapter/Device/Queue
/// - probes capabilities once
/// - owns the reference-counted shader cache for this device
pub struct GpuContext {
    /// wgpu instance, kept to create further window surfaces.
    instance: wgpu::Instance,

    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    caps: GpuCaps,

    shaders: Mutex<ShaderCache>,
}

impl GpuContext {
    /// Creates a context without any presentation surface.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu; use
    /// `pollster::block_on` from synchronous code.
    pub async fn headless(init: &GpuInit) -> Result<Arc<Self>> {
        let instance = create_instance();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        Self::from_adapter(instance, adapter, init).await.map(Arc::new)
    }

    /// Creates a context together with a presentation surface for `window`.
    ///
    /// The adapter is selected for compatibility with that surface.
    pub async fn for_window<'w>(
        window: &'w Window,
        init: &GpuInit,
    ) -> Result<(Arc<Self>, WindowSurface<'w>)> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = create_instance();
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let gpu = Arc::new(Self::from_adapter(instance, adapter, init).await?);
        let surface = WindowSurface::configure(
            Arc::clone(&gpu),
            surface,
            PixelSize::new(size.width, size.height),
            init,
        )?;

        Ok((gpu, surface))
    }

    /// Creates an additional presentation surface sharing this device.
    pub fn create_window_surface<'w>(
        self: &Arc<Self>,
        window: &'w Window,
        init: &GpuInit,
    ) -> Result<WindowSurface<'w>> {
        let size = window.inner_size();
        let surface = self
            .instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        WindowSurface::configure(
            Arc::clone(self),
            surface,
            PixelSize::new(size.width, size.height),
            init,
        )
    }

    async fn from_adapter(
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
        init: &GpuInit,
    ) -> Result<Self> {
        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let features = init.required_features | (adapter.features() & init.optional_features);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("ocular device"),
                required_features: features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = GpuCaps::probe(&adapter, &device);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            caps,
            shaders: Mutex::new(ShaderCache::new()),
        })
    }

    /// Returns a reference to the selected adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Capabilities probed at creation.
    pub fn caps(&self) -> GpuCaps {
        self.caps
    }

    /// Locks the shader cache of this context.
    ///
    /// A panic while the lock was held leaves the cache consistent (entries are
    /// only inserted after a program is fully built), so poisoning is ignored.
    pub fn shaders(&self) -> MutexGuard<'_, ShaderCache> {
        self.shaders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

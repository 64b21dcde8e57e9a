use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crate::device::GpuContext;

use super::{ContextTracker, SurfaceId};

/// Proof that the calling thread holds a canvas's GPU context.
///
/// Every GPU-bound call (allocation, drawing, resolving, read-back) takes a
/// token. Acquiring marks the canvas active in the global
/// [`ContextTracker`]; dropping releases it. Tokens are `!Send`, so they can
/// only be used on the thread that acquired them.
///
/// Acquiring again for a canvas that is already active on this thread yields a
/// re-entrant token that leaves the tracker untouched on drop.
pub struct ContextToken {
    gpu: Arc<GpuContext>,
    surface: SurfaceId,
    thread: ThreadId,
    reentrant: bool,
    _not_send: PhantomData<*const ()>,
}

impl ContextToken {
    pub fn acquire(gpu: Arc<GpuContext>, surface: SurfaceId) -> Self {
        let tracker = ContextTracker::global();
        let thread = thread::current().id();

        let reentrant = tracker.active(thread) == Some(surface);
        if !reentrant {
            tracker.set_active(thread, surface);
            log::trace!("{surface} acquired on {thread:?}");
        }

        Self { gpu, surface, thread, reentrant, _not_send: PhantomData }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub(crate) fn gpu_arc(&self) -> &Arc<GpuContext> {
        &self.gpu
    }

    pub fn device(&self) -> &wgpu::Device {
        self.gpu.device()
    }

    pub fn queue(&self) -> &wgpu::Queue {
        self.gpu.queue()
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface
    }

    pub fn thread(&self) -> ThreadId {
        self.thread
    }

    /// `true` when this token nested inside an outer token for the same canvas.
    pub fn is_reentrant(&self) -> bool {
        self.reentrant
    }
}

impl Drop for ContextToken {
    fn drop(&mut self) {
        if self.reentrant {
            return;
        }
        ContextTracker::global().clear_active(self.thread, self.surface);
        log::trace!("{} released on {:?}", self.surface, self.thread);
    }
}

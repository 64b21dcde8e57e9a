use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use anyhow::{Context, Result};

use crate::context::SurfaceId;
use crate::coords::PixelSize;
use crate::device::GpuContext;

use super::{Canvas, CanvasConfig, HostError};

type Job = Box<dyn FnOnce(&mut Canvas) + Send>;

/// Runs a [`Canvas`] on a dedicated thread.
///
/// The canvas is created, used and closed on that thread only. Other threads
/// reach it through [`call`](Self::call), which blocks until the request ran.
/// Requests run in submission order and cannot be cancelled.
pub struct CanvasHost {
    id: SurfaceId,
    worker: ThreadId,
    sender: Option<mpsc::Sender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl CanvasHost {
    pub fn spawn(gpu: Arc<GpuContext>, config: CanvasConfig, size: PixelSize) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let (id_tx, id_rx) = mpsc::channel();
        let name = format!("ocular-{}", config.label);

        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || {
                let mut canvas = Canvas::new(gpu, config, size);
                let _ = id_tx.send(canvas.id());

                for job in receiver {
                    job(&mut canvas);
                }
                canvas.close();
            })
            .context("failed to spawn canvas thread")?;

        let worker = thread.thread().id();
        let id = id_rx.recv().context("canvas thread exited during startup")?;
        log::debug!("{id} hosted on {worker:?}");

        Ok(Self { id, worker, sender: Some(sender), thread: Some(thread) })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Runs `f` on the canvas thread and returns its result.
    ///
    /// Blocks the calling thread until `f` completed.
    pub fn call<R, F>(&self, f: F) -> Result<R, HostError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Canvas) -> R + Send + 'static,
    {
        if thread::current().id() == self.worker {
            return Err(HostError::SameThread);
        }
        let sender = self.sender.as_ref().ok_or(HostError::Stopped)?;

        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        sender
            .send(Box::new(move |canvas: &mut Canvas| {
                let _ = reply_tx.send(f(canvas));
            }))
            .map_err(|_| HostError::Stopped)?;

        reply_rx.recv().map_err(|_| HostError::Stopped)
    }

    /// Closes the canvas and joins its thread after pending requests ran.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        drop(self.sender.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("{}: canvas thread panicked", self.id);
            }
        }
    }
}

impl Drop for CanvasHost {
    fn drop(&mut self) {
        self.stop();
    }
}

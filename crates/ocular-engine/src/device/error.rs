use thiserror::Error;

/// High-level response after a presentation surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Failure to obtain a frame from a [`PlatformSurface`](super::PlatformSurface).
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The surface has zero extent (minimized window); nothing to present.
    #[error("presentation surface has zero size")]
    ZeroSize,

    /// The swapchain refused a frame; `action` tells the caller how to proceed.
    #[error("presentation surface unavailable ({action:?}): {source}")]
    Unavailable {
        action: SurfaceErrorAction,
        #[source]
        source: wgpu::SurfaceError,
    },
}

impl PlatformError {
    /// `true` when rendering cannot continue on this surface.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PlatformError::Unavailable { action: SurfaceErrorAction::Fatal, .. }
        )
    }
}

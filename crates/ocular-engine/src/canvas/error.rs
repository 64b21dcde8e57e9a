use thiserror::Error;

use crate::context::SurfaceId;
use crate::device::PlatformError;
use crate::render::{ProgramError, ReadbackError, TargetError, VertexError};

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("{0} is closed")]
    Closed(SurfaceId),

    #[error("query window must be odd and at least 1, got {0}")]
    InvalidWindow(u32),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Program(#[from] ProgramError),

    #[error(transparent)]
    Vertex(#[from] VertexError),

    #[error(transparent)]
    Readback(#[from] ReadbackError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Failure to hand a request to a [`CanvasHost`](super::CanvasHost).
#[derive(Debug, Error)]
pub enum HostError {
    #[error("canvas thread has stopped")]
    Stopped,

    #[error("canvas thread cannot call into its own host")]
    SameThread,
}

//! GPU rendering subsystem.
//!
//! - `target`: the color + pick + depth render target
//! - `program`: shader programs (modules + pipeline) and their cache
//! - `vertex`: GPU buffers and attribute layouts
//! - `passes`: the canvas's fill, resolve and present programs
//! - `shapes`: pickable primitives drawn from canvas draw callbacks
//!
//! Convention:
//! - CPU geometry is in physical pixels (top-left origin, +Y down).
//! - Vertex shaders convert to NDC using a viewport uniform.

pub(crate) mod passes;
pub mod program;
pub mod readback;
pub mod shader_cache;
pub mod shapes;
pub mod target;
pub mod vertex;

pub use program::{ProgramDesc, ProgramError, ShaderProgram, ShaderStage, StageSource};
pub use readback::ReadbackError;
pub use shader_cache::{ShaderCache, Shared};
pub use target::{AttachmentKind, Completeness, RenderTarget, TargetError};
pub use vertex::{AttribType, GpuBuffer, VertexArray, VertexError, VertexScalar};

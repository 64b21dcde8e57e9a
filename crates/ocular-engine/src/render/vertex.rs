use std::ops::Range;

use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::context::ContextToken;

/// Scalar type of a vertex attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttribType {
    Float,
    Double,
    Int,
}

impl AttribType {
    /// Vertex format for `dims` components, `None` outside `1..=4`.
    pub fn vertex_format(self, dims: u32) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;
        let format = match (self, dims) {
            (AttribType::Float, 1) => F::Float32,
            (AttribType::Float, 2) => F::Float32x2,
            (AttribType::Float, 3) => F::Float32x3,
            (AttribType::Float, 4) => F::Float32x4,
            (AttribType::Double, 1) => F::Float64,
            (AttribType::Double, 2) => F::Float64x2,
            (AttribType::Double, 3) => F::Float64x3,
            (AttribType::Double, 4) => F::Float64x4,
            (AttribType::Int, 1) => F::Sint32,
            (AttribType::Int, 2) => F::Sint32x2,
            (AttribType::Int, 3) => F::Sint32x3,
            (AttribType::Int, 4) => F::Sint32x4,
            _ => return None,
        };
        Some(format)
    }
}

/// Scalars that can back a vertex attribute.
pub trait VertexScalar: bytemuck::Pod {
    const TYPE: AttribType;
}

impl VertexScalar for f32 {
    const TYPE: AttribType = AttribType::Float;
}

impl VertexScalar for f64 {
    const TYPE: AttribType = AttribType::Double;
}

impl VertexScalar for i32 {
    const TYPE: AttribType = AttribType::Int;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VertexError {
    #[error("attribute dimension {0} outside 1..=4")]
    Dimension(u32),

    #[error("attribute data length {len} is not a multiple of {dims}")]
    Ragged { len: usize, dims: u32 },

    #[error("attribute at location {location} has {got} vertices, array has {expected}")]
    CountMismatch { location: u32, got: u32, expected: u32 },

    #[error("64-bit vertex attributes are not supported by this device")]
    DoubleUnsupported,
}

/// Owned GPU buffer. `close()` destroys it and is idempotent.
pub struct GpuBuffer {
    buffer: Option<wgpu::Buffer>,
    size: u64,
}

impl GpuBuffer {
    pub fn with_contents(
        token: &ContextToken,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Self {
        let buffer = token.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        });
        Self { size: contents.len() as u64, buffer: Some(buffer) }
    }

    pub fn with_size(token: &ContextToken, label: &str, size: u64, usage: wgpu::BufferUsages) -> Self {
        let buffer = token.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });
        Self { size, buffer: Some(buffer) }
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Queues a write of `data` at `offset`. Ignored once closed.
    pub fn write(&self, token: &ContextToken, offset: u64, data: &[u8]) {
        if let Some(buffer) = &self.buffer {
            token.queue().write_buffer(buffer, offset, data);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.buffer.is_none()
    }

    pub fn close(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.close();
    }
}

struct Attribute {
    buffer: GpuBuffer,
    attribute: [wgpu::VertexAttribute; 1],
    stride: u64,
    count: u32,
}

/// Per-attribute vertex buffers plus an optional index buffer.
///
/// Each attribute lives in its own buffer bound to the slot matching its
/// position in the array; `layouts()` lists them in that order so it can be
/// passed to [`ProgramDesc::vertex_buffers`](super::ProgramDesc) directly.
pub struct VertexArray {
    label: String,
    attributes: Vec<Attribute>,
    indices: Option<(GpuBuffer, u32)>,
}

impl VertexArray {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), attributes: Vec::new(), indices: None }
    }

    /// Uploads `data` as attribute `location` with `dims` components per vertex,
    /// replacing any previous attribute at that location.
    pub fn set_attribute<T: VertexScalar>(
        &mut self,
        token: &ContextToken,
        location: u32,
        dims: u32,
        data: &[T],
    ) -> Result<(), VertexError> {
        let format = T::TYPE.vertex_format(dims).ok_or(VertexError::Dimension(dims))?;
        if data.len() % dims as usize != 0 {
            return Err(VertexError::Ragged { len: data.len(), dims });
        }
        if T::TYPE == AttribType::Double && !token.gpu().caps().vertex_f64 {
            return Err(VertexError::DoubleUnsupported);
        }

        let count = (data.len() / dims as usize) as u32;
        if let Some(other) = self
            .attributes
            .iter()
            .find(|a| a.attribute[0].shader_location != location)
        {
            if other.count != count {
                return Err(VertexError::CountMismatch { location, got: count, expected: other.count });
            }
        }

        let buffer = GpuBuffer::with_contents(
            token,
            &format!("{} attr {location}", self.label),
            bytemuck::cast_slice(data),
            wgpu::BufferUsages::VERTEX,
        );
        let attribute = Attribute {
            buffer,
            attribute: [wgpu::VertexAttribute { format, offset: 0, shader_location: location }],
            stride: format.size(),
            count,
        };

        match self
            .attributes
            .iter_mut()
            .find(|a| a.attribute[0].shader_location == location)
        {
            Some(slot) => *slot = attribute,
            None => self.attributes.push(attribute),
        }
        Ok(())
    }

    /// Uploads an index buffer; draws become indexed.
    pub fn set_indices(&mut self, token: &ContextToken, indices: &[u32]) {
        let buffer = GpuBuffer::with_contents(
            token,
            &format!("{} indices", self.label),
            bytemuck::cast_slice(indices),
            wgpu::BufferUsages::INDEX,
        );
        self.indices = Some((buffer, indices.len() as u32));
    }

    pub fn vertex_count(&self) -> u32 {
        self.attributes.first().map_or(0, |a| a.count)
    }

    pub fn index_count(&self) -> Option<u32> {
        self.indices.as_ref().map(|(_, n)| *n)
    }

    /// Buffer layouts in slot order.
    pub fn layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.attributes
            .iter()
            .map(|a| wgpu::VertexBufferLayout {
                array_stride: a.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &a.attribute,
            })
            .collect()
    }

    /// Binds every buffer and draws the whole array.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instances: Range<u32>) {
        for (slot, attr) in self.attributes.iter().enumerate() {
            let Some(buffer) = attr.buffer.buffer() else { return };
            pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }

        match &self.indices {
            Some((indices, count)) => {
                let Some(buffer) = indices.buffer() else { return };
                pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..*count, 0, instances);
            }
            None => pass.draw(0..self.vertex_count(), instances),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.attributes.is_empty() && self.indices.is_none()
    }

    /// Destroys all buffers. Calling it again is a no-op.
    pub fn close(&mut self) {
        for mut attr in self.attributes.drain(..) {
            attr.buffer.close();
        }
        if let Some((mut indices, _)) = self.indices.take() {
            indices.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_cover_every_type_and_dimension() {
        for ty in [AttribType::Float, AttribType::Double, AttribType::Int] {
            for dims in 1..=4 {
                assert!(ty.vertex_format(dims).is_some(), "{ty:?} x{dims}");
            }
            assert_eq!(ty.vertex_format(0), None);
            assert_eq!(ty.vertex_format(5), None);
        }
    }

    #[test]
    fn strides_follow_scalar_width() {
        assert_eq!(AttribType::Float.vertex_format(3).map(|f| f.size()), Some(12));
        assert_eq!(AttribType::Double.vertex_format(2).map(|f| f.size()), Some(16));
        assert_eq!(AttribType::Int.vertex_format(1).map(|f| f.size()), Some(4));
    }

    #[test]
    fn empty_array_is_closed_and_has_no_layouts() {
        let mut va = VertexArray::new("quad");
        assert!(va.is_closed());
        assert!(va.layouts().is_empty());
        va.close();
        va.close();
        assert_eq!(va.vertex_count(), 0);
    }
}

//! Texture readback from GPU to host memory.

use std::sync::mpsc;

use thiserror::Error;

use crate::context::ContextToken;
use crate::coords::PixelRect;

const BYTES_PER_TEXEL: u32 = 4;

#[derive(Debug, Error)]
pub enum ReadbackError {
    #[error("readback region is empty or starts before the texture origin")]
    InvalidRegion,

    #[error("failed to map readback buffer: {0}")]
    Map(#[from] wgpu::BufferAsyncError),

    #[error("device lost while waiting for readback")]
    Disconnected,
}

/// Copies `region` of a 4-byte-per-texel, single-sampled `texture` into host
/// memory, row-major with no padding.
///
/// Blocks the calling thread until the GPU finished the copy.
pub fn read_region(
    token: &ContextToken,
    texture: &wgpu::Texture,
    region: PixelRect,
) -> Result<Vec<u8>, ReadbackError> {
    if region.is_empty() || region.x < 0 || region.y < 0 {
        return Err(ReadbackError::InvalidRegion);
    }

    let device = token.device();
    let row_bytes = region.width * BYTES_PER_TEXEL;
    let padded_bpr = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("ocular readback"),
        size: u64::from(padded_bpr) * u64::from(region.height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("ocular readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: region.x as u32, y: region.y as u32, z: 0 },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(region.height),
            },
        },
        wgpu::Extent3d {
            width: region.width,
            height: region.height,
            depth_or_array_layers: 1,
        },
    );
    token.queue().submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = sender.send(res);
    });
    if let Err(err) = device.poll(wgpu::PollType::wait_indefinitely()) {
        log::warn!("poll while waiting for readback failed: {err}");
    }
    receiver.recv().map_err(|_| ReadbackError::Disconnected)??;

    let mapped = slice.get_mapped_range();
    let mut data = Vec::with_capacity((row_bytes * region.height) as usize);
    for row in mapped.chunks_exact(padded_bpr as usize) {
        data.extend_from_slice(&row[..row_bytes as usize]);
    }
    drop(mapped);
    staging.unmap();

    Ok(data)
}

/// Packs tightly stored `Rgba8Unorm` texels into `0xAARRGGBB` values.
pub fn texels_to_argb(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(BYTES_PER_TEXEL as usize)
        .map(|t| crate::picking::argb_from_rgba8([t[0], t[1], t[2], t[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texels_pack_in_row_major_order() {
        let bytes = [
            10, 10, 10, 255, //
            0, 0x12, 0x34, 0xFF, //
        ];
        assert_eq!(texels_to_argb(&bytes), vec![0xFF0A_0A0A, 0xFF00_1234]);
    }
}

/// Sentinel for "nothing here": fully transparent, zero RGB.
pub const NOTHING: u32 = 0x0000_0000;

/// Alpha byte every pick id carries.
pub const ALPHA_MASK: u32 = 0xFF00_0000;

/// Bits that identify the object.
pub const KEY_MASK: u32 = 0x00FF_FFFF;

/// Packs an `Rgba8Unorm` texel into `0xAARRGGBB`.
#[inline]
pub fn argb_from_rgba8(texel: [u8; 4]) -> u32 {
    let [r, g, b, a] = texel;
    u32::from_be_bytes([a, r, g, b])
}

/// Shader-side color that stores `id` in an `Rgba8Unorm` attachment.
///
/// Channel values are `byte / 255`, which unorm storage maps back exactly.
#[inline]
pub fn id_to_color(id: u32) -> [f32; 4] {
    let [a, r, g, b] = id.to_be_bytes();
    [
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        f32::from(a) / 255.0,
    ]
}

/// Registry key of a non-zero pick value.
#[inline]
pub fn pick_key(value: u32) -> u32 {
    value & KEY_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texel_bytes_pack_as_argb() {
        assert_eq!(argb_from_rgba8([0x00, 0x12, 0x34, 0xFF]), 0xFF00_1234);
        assert_eq!(argb_from_rgba8([0, 0, 0, 0]), NOTHING);
    }

    #[test]
    fn id_color_survives_unorm_quantization() {
        let id = 0xFF00_1234;
        let texel = id_to_color(id).map(|c| (c * 255.0).round() as u8);
        assert_eq!(argb_from_rgba8(texel), id);
    }

    #[test]
    fn key_strips_alpha() {
        assert_eq!(pick_key(0xFF00_1234), 0x1234);
    }
}

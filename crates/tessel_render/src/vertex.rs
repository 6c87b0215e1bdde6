//! Vertex format shared by meshes and the batch renderer

/// Position + UV + packed color. 20 bytes, tightly packed.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PosTexColorVertex {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
    /// See [`pack_rgba`].
    pub rgba: u32,
}

impl PosTexColorVertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32, rgba: u32) -> Self {
        Self { x, y, u, v, rgba }
    }
}

/// Bytes per vertex.
pub const VERTEX_STRIDE: u32 = std::mem::size_of::<PosTexColorVertex>() as u32;

/// Bytes per index (`u16`).
pub const INDEX_STRIDE: u32 = std::mem::size_of::<u16>() as u32;

/// Opaque white.
pub const WHITE: u32 = 0xFFFF_FFFF;

/// Pack a color so that its in-memory byte order is R, G, B, A
/// (matches an `Unorm8x4` vertex attribute on little-endian hosts).
pub const fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from_le_bytes([r, g, b, a])
}

/// Inverse of [`pack_rgba`].
pub const fn unpack_rgba(rgba: u32) -> [u8; 4] {
    rgba.to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_twenty_bytes() {
        assert_eq!(VERTEX_STRIDE, 20);
        assert_eq!(INDEX_STRIDE, 2);
    }

    #[test]
    fn packed_color_keeps_channel_order() {
        let c = pack_rgba(0x11, 0x22, 0x33, 0x44);
        assert_eq!(unpack_rgba(c), [0x11, 0x22, 0x33, 0x44]);
        assert_eq!(pack_rgba(255, 255, 255, 255), WHITE);
    }
}

//! Affine math utilities
//!
//! Re-exports glam with the 2D transform helpers used by sprite fill.

pub use glam::*;

/// Build a 2D model matrix from translation/rotation/scale, with `origin`
/// (in local units) moved onto the model origin first.
///
/// Equivalent to `T(position) * R(rotation) * S(scale) * T(-origin)`.
pub fn srt_affine(position: Vec2, rotation: f32, scale: Vec2, origin: Vec2) -> Affine2 {
    Affine2::from_scale_angle_translation(scale, rotation, position)
        * Affine2::from_translation(-origin)
}

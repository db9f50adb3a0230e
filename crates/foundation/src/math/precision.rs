//! Camera-relative precision.
//!
//! Scene positions live in Web Mercator meters, which are far too large for
//! `f32` near the antimeridian. Anything handed to a draw backend is first
//! expressed relative to a high-precision origin (the camera target), then
//! narrowed.

use super::Vec3;

/// GPU-friendly, camera-relative position in `f32`.
pub type CameraRelativeF32 = [f32; 3];

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraRelative {
    pub origin: Vec3,
}

impl CameraRelative {
    pub fn new(origin: Vec3) -> Self {
        Self { origin }
    }

    /// Convert a world-space point (f64) to a camera-relative `f32` offset.
    #[inline]
    pub fn to_f32(self, world: Vec3) -> CameraRelativeF32 {
        let d = world - self.origin;
        [d.x as f32, d.y as f32, d.z as f32]
    }
}

#[inline]
pub fn camera_relative_f32(world: Vec3, origin: Vec3) -> CameraRelativeF32 {
    CameraRelative::new(origin).to_f32(world)
}

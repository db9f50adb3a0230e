use foundation::math::{Vec3, mercator_from_geo};
use foundation::Pose;

use crate::components::Drawable3D;

/// Resolved model transform in world space (mercator meters, z up).
///
/// Rotation is Euler degrees about x, y, z, applied in that order after the
/// pivot translation and scaling. Heading is clockwise from north, so it
/// enters as a negative rotation about z.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation_deg: Vec3,
    pub scale: Vec3,
    /// Model-space translation applied before scale and rotation.
    pub pivot: Vec3,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation_deg: Vec3::ZERO,
            scale: Vec3::ONE,
            pivot: Vec3::ZERO,
        }
    }

    pub fn translate(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Places `drawable` at `pose` for a camera at `zoom`.
    pub fn for_model(pose: Pose, drawable: &Drawable3D, zoom: f64) -> Self {
        let m = mercator_from_geo(pose.position);
        let offset = drawable.rotation_offset_deg;
        Self {
            position: Vec3::new(m.x, m.y, 0.0),
            rotation_deg: Vec3::new(offset.x, offset.y, offset.z - pose.heading.degrees()),
            scale: drawable.world_scale(pose.position.latitude(), zoom),
            pivot: Vec3::ZERO - drawable.pivot,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::math::{GeoCoordinate, Heading};

/// Placement of a tracked object: where it is and which way it faces.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: GeoCoordinate,
    pub heading: Heading,
}

impl Pose {
    pub fn new(position: GeoCoordinate, heading: Heading) -> Self {
        Self { position, heading }
    }

    /// Pose at `position` facing north.
    pub fn at(position: GeoCoordinate) -> Self {
        Self::new(position, Heading::NORTH)
    }

    /// Pose after moving to `fix`: heading follows the great-circle bearing
    /// from the current position, and is kept as-is when the fix repeats the
    /// current position.
    pub fn advanced_to(self, fix: GeoCoordinate) -> Pose {
        let heading = self.position.bearing_to(&fix).unwrap_or(self.heading);
        Pose::new(fix, heading)
    }

    /// Pose at fraction `t` between `self` and `to` (great-circle position,
    /// shortest-arc heading).
    pub fn interpolate(self, to: Pose, t: f64) -> Pose {
        Pose::new(
            self.position.interpolate(&to.position, t),
            self.heading.lerp(to.heading, t),
        )
    }
}

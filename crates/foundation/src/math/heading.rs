use serde::{Deserialize, Serialize};

use super::GeoError;

/// Facing direction in degrees clockwise from geographic north, in [0, 360).
///
/// Rotation about the vertical axis only.
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Heading(f64);

impl Heading {
    pub const NORTH: Heading = Heading(0.0);
    pub const EAST: Heading = Heading(90.0);
    pub const SOUTH: Heading = Heading(180.0);
    pub const WEST: Heading = Heading(270.0);

    /// Normalizes any finite angle into [0, 360).
    pub fn from_degrees(degrees: f64) -> Result<Self, GeoError> {
        if !degrees.is_finite() {
            return Err(GeoError::NonFiniteHeading(degrees));
        }
        Ok(Self::wrap(degrees))
    }

    /// Infallible normalization for angles produced by our own math.
    /// Non-finite input maps to north.
    pub(crate) fn wrap(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Self::NORTH;
        }
        let d = degrees.rem_euclid(360.0);
        // rem_euclid can round tiny negatives up to exactly 360.0.
        if d >= 360.0 { Self(0.0) } else { Self(d) }
    }

    pub fn degrees(self) -> f64 {
        self.0
    }

    pub fn radians(self) -> f64 {
        self.0.to_radians()
    }

    /// Signed shortest rotation from `self` to `to`, in (-180, 180].
    pub fn delta_to(self, to: Heading) -> f64 {
        let d = (to.0 - self.0).rem_euclid(360.0);
        if d > 180.0 { d - 360.0 } else { d }
    }

    /// Rotates along the shortest arc towards `to` by fraction `t` in [0, 1].
    pub fn lerp(self, to: Heading, t: f64) -> Heading {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t >= 1.0 {
            return to;
        }
        Self::wrap(self.0 + self.delta_to(to) * t)
    }
}

impl TryFrom<f64> for Heading {
    type Error = GeoError;

    fn try_from(degrees: f64) -> Result<Self, Self::Error> {
        Heading::from_degrees(degrees)
    }
}

impl From<Heading> for f64 {
    fn from(heading: Heading) -> Self {
        heading.0
    }
}

impl std::fmt::Display for Heading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}°", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Heading;
    use proptest::prelude::*;

    #[test]
    fn normalizes_into_range() {
        assert_eq!(Heading::from_degrees(-90.0).unwrap(), Heading::WEST);
        assert_eq!(Heading::from_degrees(450.0).unwrap(), Heading::EAST);
        assert_eq!(Heading::from_degrees(360.0).unwrap(), Heading::NORTH);
        assert_eq!(Heading::from_degrees(-1e-18).unwrap().degrees(), 0.0);
        assert!(Heading::from_degrees(f64::NAN).is_err());
    }

    #[test]
    fn delta_takes_the_short_way_round() {
        let a = Heading::from_degrees(350.0).unwrap();
        let b = Heading::from_degrees(10.0).unwrap();
        assert_eq!(a.delta_to(b), 20.0);
        assert_eq!(b.delta_to(a), -20.0);
        assert_eq!(Heading::NORTH.delta_to(Heading::SOUTH), 180.0);
    }

    #[test]
    fn lerp_wraps_through_north() {
        let a = Heading::from_degrees(350.0).unwrap();
        let b = Heading::from_degrees(10.0).unwrap();
        assert_eq!(a.lerp(b, 0.5), Heading::NORTH);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.0), a);
    }

    proptest! {
        #[test]
        fn any_finite_angle_lands_in_range(deg in -1e6f64..1e6) {
            let h = Heading::from_degrees(deg).unwrap();
            prop_assert!((0.0..360.0).contains(&h.degrees()));
        }
    }
}

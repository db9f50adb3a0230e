use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Heading;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// Mean Earth radius (meters) used for spherical great-circle math.
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Below this angular distance (radians) two coordinates are treated as the
/// same point for interpolation purposes.
const COINCIDENT_RAD: f64 = 1e-12;

#[derive(Debug, Copy, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("coordinate out of range: longitude {longitude}, latitude {latitude}")]
    OutOfRange { longitude: f64, latitude: f64 },
    #[error("heading is not finite: {0}")]
    NonFiniteHeading(f64),
}

/// WGS84 longitude/latitude pair in degrees.
///
/// Always in range: longitude in [-180, 180], latitude in [-90, 90]. The only
/// way to build one is through [`GeoCoordinate::new`] (or deserialization,
/// which goes through the same check).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinateRepr")]
pub struct GeoCoordinate {
    longitude: f64,
    latitude: f64,
}

/// Accepted wire shapes: `{"longitude": .., "latitude": ..}` (with `lng`/`lon`
/// and `lat` aliases) or a GeoJSON-style `[lon, lat]` pair.
#[derive(Deserialize)]
#[serde(untagged)]
enum CoordinateRepr {
    Object {
        #[serde(alias = "lng", alias = "lon")]
        longitude: f64,
        #[serde(alias = "lat")]
        latitude: f64,
    },
    Pair([f64; 2]),
}

impl TryFrom<CoordinateRepr> for GeoCoordinate {
    type Error = GeoError;

    fn try_from(repr: CoordinateRepr) -> Result<Self, Self::Error> {
        match repr {
            CoordinateRepr::Object {
                longitude,
                latitude,
            } => GeoCoordinate::new(longitude, latitude),
            CoordinateRepr::Pair([longitude, latitude]) => GeoCoordinate::new(longitude, latitude),
        }
    }
}

impl GeoCoordinate {
    /// Equator at the prime meridian.
    pub const ORIGIN: GeoCoordinate = GeoCoordinate {
        longitude: 0.0,
        latitude: 0.0,
    };

    pub fn new(longitude: f64, latitude: f64) -> Result<Self, GeoError> {
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        if !lon_ok || !lat_ok {
            return Err(GeoError::OutOfRange {
                longitude,
                latitude,
            });
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// `[lon, lat]`, the order map libraries expect.
    pub fn as_lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Great-circle initial bearing from `self` towards `to`.
    ///
    /// Returns `None` when both points are identical: the bearing formula
    /// degenerates to `atan2(0, 0)` there and has no meaningful direction.
    pub fn bearing_to(&self, to: &GeoCoordinate) -> Option<Heading> {
        if self == to {
            return None;
        }
        Some(Heading::wrap(initial_bearing_deg(*self, *to)))
    }

    /// Haversine distance in meters.
    pub fn distance_m(&self, to: &GeoCoordinate) -> f64 {
        angular_distance_rad(*self, *to) * MEAN_EARTH_RADIUS_M
    }

    /// Point at fraction `t` along the great circle from `self` to `to`.
    ///
    /// `t` is clamped to [0, 1]; the endpoints are returned exactly.
    pub fn interpolate(&self, to: &GeoCoordinate, t: f64) -> GeoCoordinate {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t <= 0.0 {
            return *self;
        }
        if t >= 1.0 {
            return *to;
        }

        let delta = angular_distance_rad(*self, *to);
        if delta < COINCIDENT_RAD {
            return *self;
        }

        let (lat1, lon1) = (self.latitude.to_radians(), self.longitude.to_radians());
        let (lat2, lon2) = (to.latitude.to_radians(), to.longitude.to_radians());

        let sin_delta = delta.sin();
        let a = ((1.0 - t) * delta).sin() / sin_delta;
        let b = (t * delta).sin() / sin_delta;

        let x = a * lat1.cos() * lon1.cos() + b * lat2.cos() * lon2.cos();
        let y = a * lat1.cos() * lon1.sin() + b * lat2.cos() * lon2.sin();
        let z = a * lat1.sin() + b * lat2.sin();

        let lat = z.atan2((x * x + y * y).sqrt()).to_degrees();
        let lon = wrap_lon_deg(y.atan2(x).to_degrees());

        GeoCoordinate {
            longitude: lon,
            latitude: lat.clamp(-90.0, 90.0),
        }
    }
}

/// Initial great-circle bearing in degrees, clockwise from north, in [0, 360).
///
/// `atan2(sin Δλ · cos φ2, cos φ1 · sin φ2 − sin φ1 · cos φ2 · cos Δλ)`.
/// Identical inputs yield 0; callers that care use
/// [`GeoCoordinate::bearing_to`], which reports that case as `None`.
pub fn initial_bearing_deg(from: GeoCoordinate, to: GeoCoordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    Heading::wrap(y.atan2(x).to_degrees()).degrees()
}

fn angular_distance_rad(a: GeoCoordinate, b: GeoCoordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

pub fn wrap_lon_deg(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        return lon;
    }
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

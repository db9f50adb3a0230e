//! Web Mercator helpers shared by the map camera and the 3D scene.
//!
//! Both renderers agree on one world space: spherical Web Mercator meters,
//! x east, y north, z up (altitude in mercator-scaled meters).

use super::{GeoCoordinate, Vec2, WGS84_A, wrap_lon_deg};

pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_78;

/// Tile edge in CSS pixels at integer zoom levels.
pub const TILE_SIZE_PX: f64 = 512.0;

/// Circumference of the mercator world square (meters).
pub const MERCATOR_WORLD_WIDTH_M: f64 = 2.0 * std::f64::consts::PI * WGS84_A;

pub fn is_mercator_lat_valid(lat_deg: f64) -> bool {
    lat_deg.is_finite() && (-MERCATOR_MAX_LAT_DEG..=MERCATOR_MAX_LAT_DEG).contains(&lat_deg)
}

pub fn mercator_x_m(lon_deg: f64) -> f64 {
    WGS84_A * lon_deg.to_radians()
}

pub fn mercator_y_m(lat_deg: f64) -> f64 {
    let lat = lat_deg
        .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
        .to_radians();
    WGS84_A * (0.5 * (std::f64::consts::FRAC_PI_2 + lat)).tan().ln()
}

pub fn mercator_from_geo(coord: GeoCoordinate) -> Vec2 {
    Vec2::new(
        mercator_x_m(coord.longitude()),
        mercator_y_m(coord.latitude()),
    )
}

/// Inverse projection. Longitude wraps, latitude saturates at the mercator
/// limit, so the result is always a valid coordinate (non-finite input maps to the origin).
pub fn geo_from_mercator(m: Vec2) -> GeoCoordinate {
    let lon = wrap_lon_deg((m.x / WGS84_A).to_degrees());
    let lat = (2.0 * (m.y / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2)
        .to_degrees()
        .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG);
    // Only non-finite input can fail the range check.
    GeoCoordinate::new(lon, lat).unwrap_or(GeoCoordinate::ORIGIN)
}

/// Mercator meters per ground meter at `lat_deg` (1 / cos φ).
pub fn mercator_scale_at(lat_deg: f64) -> f64 {
    let lat = lat_deg.clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG);
    1.0 / lat.to_radians().cos()
}

/// Mercator meters covered by one CSS pixel at `zoom`.
pub fn mercator_m_per_px(zoom: f64) -> f64 {
    MERCATOR_WORLD_WIDTH_M / (TILE_SIZE_PX * 2f64.powf(zoom))
}

/// Ground meters covered by one CSS pixel at `zoom` and `lat_deg`.
pub fn ground_m_per_px(zoom: f64, lat_deg: f64) -> f64 {
    mercator_m_per_px(zoom) / mercator_scale_at(lat_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn equator_prime_meridian_is_origin() {
        let m = mercator_from_geo(GeoCoordinate::new(0.0, 0.0).unwrap());
        assert_close(m.x, 0.0, 1e-9);
        assert_close(m.y, 0.0, 1e-6);
    }

    #[test]
    fn projection_round_trips() {
        let c = GeoCoordinate::new(90.4125, 23.8103).unwrap();
        let back = geo_from_mercator(mercator_from_geo(c));
        assert_close(back.longitude(), c.longitude(), 1e-9);
        assert_close(back.latitude(), c.latitude(), 1e-9);
    }

    #[test]
    fn latitude_saturates_at_mercator_limit() {
        assert!(!is_mercator_lat_valid(89.0));
        assert_eq!(mercator_y_m(89.0), mercator_y_m(MERCATOR_MAX_LAT_DEG));
    }

    #[test]
    fn pixel_size_halves_per_zoom_level() {
        assert_close(mercator_m_per_px(1.0) * 2.0, mercator_m_per_px(0.0), 1e-6);
        // At zoom 0 the whole world fits one 512px tile.
        assert_close(mercator_m_per_px(0.0) * TILE_SIZE_PX, MERCATOR_WORLD_WIDTH_M, 1e-6);
        assert_close(ground_m_per_px(18.0, 0.0), mercator_m_per_px(18.0), 1e-12);
    }
}

use foundation::GeoCoordinate;
use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;

pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 24.0;
pub const MAX_PITCH_DEG: f64 = 85.0;

pub const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/streets-v12";

/// Initial state and presentation options of a map surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center: GeoCoordinate,
    pub zoom: f64,
    /// Tilt away from straight down, degrees.
    pub pitch: f64,
    /// Rotation of the map, degrees clockwise from north.
    pub bearing: f64,
    pub antialias: bool,
    pub style: String,
    /// Credential for the style provider. Never serialized back out.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: GeoCoordinate::ORIGIN,
            zoom: 0.0,
            pitch: 0.0,
            bearing: 0.0,
            antialias: false,
            style: DEFAULT_STYLE.to_string(),
            access_token: None,
        }
    }
}

impl MapConfig {
    pub fn validate(&self) -> Result<(), SurfaceError> {
        if !self.zoom.is_finite() || !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom) {
            return Err(SurfaceError::Initialization(format!(
                "zoom {} outside [{MIN_ZOOM}, {MAX_ZOOM}]",
                self.zoom
            )));
        }
        if !self.pitch.is_finite() || !(0.0..=MAX_PITCH_DEG).contains(&self.pitch) {
            return Err(SurfaceError::Initialization(format!(
                "pitch {} outside [0, {MAX_PITCH_DEG}]",
                self.pitch
            )));
        }
        if !self.bearing.is_finite() {
            return Err(SurfaceError::Initialization(format!(
                "bearing {} is not finite",
                self.bearing
            )));
        }
        if self.style.trim().is_empty() {
            return Err(SurfaceError::Initialization("style id is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MapConfig;
    use crate::error::SurfaceError;

    #[test]
    fn defaults_are_valid() {
        assert!(MapConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_camera() {
        for config in [
            MapConfig { zoom: 25.0, ..MapConfig::default() },
            MapConfig { pitch: 90.0, ..MapConfig::default() },
            MapConfig { bearing: f64::NAN, ..MapConfig::default() },
            MapConfig { style: " ".to_string(), ..MapConfig::default() },
        ] {
            assert!(matches!(config.validate(), Err(SurfaceError::Initialization(_))));
        }
    }

    #[test]
    fn partial_json_fills_defaults_and_hides_token() {
        let config: MapConfig = serde_json::from_str(
            r#"{"center": [90.4125, 23.8103], "zoom": 18, "access_token": "pk.secret"}"#,
        )
        .unwrap();
        assert_eq!(config.zoom, 18.0);
        assert_eq!(config.center.longitude(), 90.4125);
        assert_eq!(config.access_token.as_deref(), Some("pk.secret"));

        let out = serde_json::to_string(&config).unwrap();
        assert!(!out.contains("pk.secret"));
    }
}

use std::path::{Path, PathBuf};

use bridge::{AnchorMode, Axes, ObjectSpec};
use formats::ModelFormat;
use foundation::GeoCoordinate;
use map::MapConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracking::{ControllerOptions, ORBIT_RADIUS_DEG};

pub const DEFAULT_ASSET: &str = "models/bus.glb";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Synthetic fixes circling the map center.
    #[default]
    Orbit,
    /// JSON coordinates, one per line, on standard input.
    Stdin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub interval_ms: u64,
    pub radius_deg: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Orbit,
            interval_ms: 1000,
            radius_deg: ORBIT_RADIUS_DEG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub map: MapConfig,
    /// Directory the asset path is resolved against.
    pub asset_root: PathBuf,
    pub object: ObjectSpec,
    pub source: SourceConfig,
    pub controller: ControllerOptions,
    pub fps: u32,
    /// Stop after this long; run until ctrl-c when unset.
    pub duration_s: Option<f64>,
    /// Keep the map centered on the vehicle.
    pub follow: bool,
    pub viewport_px: (u32, u32),
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let dhaka = GeoCoordinate::new(90.4125, 23.8103).unwrap_or(GeoCoordinate::ORIGIN);
        Self {
            map: MapConfig {
                center: dhaka,
                zoom: 18.0,
                pitch: 60.0,
                bearing: 0.0,
                antialias: true,
                ..MapConfig::default()
            },
            asset_root: PathBuf::from("public"),
            object: ObjectSpec {
                scale: Axes::splat(0.1),
                rotation_deg: Axes::new(90.0, 90.0, 0.0),
                anchor: AnchorMode::Center,
                tooltip: Some("Bus #123".to_string()),
                ..ObjectSpec::new(DEFAULT_ASSET, ModelFormat::Glb)
            },
            source: SourceConfig::default(),
            controller: ControllerOptions::default(),
            fps: 60,
            duration_s: None,
            follow: false,
            viewport_px: (500, 500),
        }
    }
}

impl TrackerConfig {
    /// Reads a JSON config. Fields the file leaves out, at any depth, keep
    /// their default values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let payload = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&payload).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(payload: &str) -> Result<Self, serde_json::Error> {
        let overrides: Value = serde_json::from_str(payload)?;
        let mut merged = serde_json::to_value(Self::default())?;
        merge(&mut merged, overrides);
        serde_json::from_value(merged)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.map
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !(1..=240).contains(&self.fps) {
            return Err(ConfigError::Invalid(format!("fps {} outside [1, 240]", self.fps)));
        }
        if self.source.interval_ms == 0 {
            return Err(ConfigError::Invalid("fix interval must be positive".to_string()));
        }
        if let Some(d) = self.duration_s {
            if !d.is_finite() || d <= 0.0 {
                return Err(ConfigError::Invalid(format!("duration {d} must be positive")));
            }
        }
        if self.viewport_px.0 == 0 || self.viewport_px.1 == 0 {
            return Err(ConfigError::Invalid("viewport must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Objects merge key by key; any other override value replaces the base
/// value whole (arrays included).
fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

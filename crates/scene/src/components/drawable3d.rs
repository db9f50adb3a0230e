use foundation::math::{Vec3, mercator_m_per_px, mercator_scale_at};
use serde::{Deserialize, Serialize};

/// Identity of a decoded model asset (content hash prefix).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u64);

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Linear unit system of a model.
///
/// `Meters` pins the model to real-world size at every zoom level; `Pixels`
/// keeps it a constant on-screen size, so it grows and shrinks in world space
/// as the map zooms.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Meters,
    Pixels,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drawable3D {
    pub asset: AssetId,
    /// Per-axis scale applied in model space.
    pub scale: Vec3,
    pub units: Units,
    /// Fixed rotation (degrees, x/y/z) that turns the asset's native
    /// orientation into "facing north, z up".
    pub rotation_offset_deg: Vec3,
    /// Model-space point that sits on the geographic anchor.
    pub pivot: Vec3,
}

impl Drawable3D {
    pub fn model(asset: AssetId) -> Self {
        Self {
            asset,
            scale: Vec3::ONE,
            units: Units::Meters,
            rotation_offset_deg: Vec3::ZERO,
            pivot: Vec3::ZERO,
        }
    }

    /// World-space (mercator meters) scale at `lat_deg` and `zoom`.
    pub fn world_scale(&self, lat_deg: f64, zoom: f64) -> Vec3 {
        let unit = match self.units {
            Units::Meters => mercator_scale_at(lat_deg),
            Units::Pixels => mercator_m_per_px(zoom),
        };
        self.scale.scale(unit)
    }
}

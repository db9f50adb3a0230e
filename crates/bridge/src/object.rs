use foundation::Pose;
use foundation::math::Vec3;
use formats::ModelFormat;
use scene::components::{ComponentBounds, Placement, Units, Visibility};
use scene::entity::EntityId;
use serde::{Deserialize, Serialize};

use crate::bridge::SceneBridge;

/// Per-axis values in the `{ "x": .., "y": .., "z": .. }` shape.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Axes {
    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<Axes> for Vec3 {
    fn from(a: Axes) -> Self {
        Vec3::new(a.x, a.y, a.z)
    }
}

/// Which point of the model's bounds sits on its coordinate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    /// Center of the bounding box.
    Center,
    /// Center of the bounding box floor.
    Bottom,
    /// The model's own origin.
    #[default]
    Auto,
}

impl AnchorMode {
    /// Model-space pivot for this mode. Models without declared bounds pivot
    /// on their origin.
    pub fn pivot(self, bounds: Option<ComponentBounds>) -> Vec3 {
        match (self, bounds) {
            (AnchorMode::Center, Some(b)) => b.center(),
            (AnchorMode::Bottom, Some(b)) => b.bottom_center(),
            _ => Vec3::ZERO,
        }
    }
}

/// Everything needed to load a model and place it in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// Asset path, relative to the loader's root.
    pub asset: String,
    pub format: ModelFormat,
    #[serde(default = "unit_scale")]
    pub scale: Axes,
    #[serde(default)]
    pub units: Units,
    /// Turns the model's native orientation into "facing north, z up".
    #[serde(default = "no_rotation")]
    pub rotation_deg: Axes,
    #[serde(default)]
    pub anchor: AnchorMode,
    #[serde(default)]
    pub tooltip: Option<String>,
}

fn unit_scale() -> Axes {
    Axes::splat(1.0)
}

fn no_rotation() -> Axes {
    Axes::splat(0.0)
}

impl ObjectSpec {
    pub fn new(asset: impl Into<String>, format: ModelFormat) -> Self {
        Self {
            asset: asset.into(),
            format,
            scale: unit_scale(),
            units: Units::Meters,
            rotation_deg: no_rotation(),
            anchor: AnchorMode::Auto,
            tooltip: None,
        }
    }
}

/// A model living in a bridge's scene.
///
/// There is one handle per object: it is not `Clone`, and dropping it
/// removes the object. Once the bridge is cancelled the object is already
/// gone and every method is a no-op.
#[derive(Debug)]
pub struct VehicleObject {
    bridge: SceneBridge,
    entity: EntityId,
}

impl VehicleObject {
    pub(crate) fn new(bridge: SceneBridge, entity: EntityId) -> Self {
        Self { bridge, entity }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn is_alive(&self) -> bool {
        self.bridge.with_world(|w| w.is_alive(self.entity))
    }

    /// Last committed pose; `None` before the first one or after removal.
    pub fn pose(&self) -> Option<Pose> {
        self.placement().map(|p| p.committed)
    }

    /// Pose the renderer draws on the next frame.
    pub fn displayed_pose(&self) -> Option<Pose> {
        self.placement().map(|p| p.displayed)
    }

    pub fn placement(&self) -> Option<Placement> {
        self.bridge.with_world(|w| w.placement(self.entity))
    }

    /// Commits position and heading together, with nothing in flight.
    pub fn set_pose(&self, pose: Pose) -> bool {
        self.bridge.with_world(|w| w.commit_pose(self.entity, pose))
    }

    /// Commits a placement whose displayed pose may trail the committed one.
    pub fn set_placement(&self, placement: Placement) -> bool {
        self.bridge
            .with_world(|w| w.set_placement(self.entity, placement))
    }

    pub fn tooltip(&self) -> Option<String> {
        self.bridge.with_world(|w| {
            w.properties(self.entity)
                .and_then(|p| p.tooltip())
                .map(str::to_string)
        })
    }

    pub fn is_visible(&self) -> bool {
        self.bridge.with_world(|w| {
            w.visibility(self.entity)
                .map(Visibility::is_shown)
                .unwrap_or(false)
        })
    }
}

impl Drop for VehicleObject {
    fn drop(&mut self) {
        self.bridge.with_world(|w| w.despawn(self.entity));
    }
}

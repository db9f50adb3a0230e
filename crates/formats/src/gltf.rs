//! The subset of the glTF 2.0 JSON schema needed to validate and summarize
//! a model. Unknown fields are ignored.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GltfDocument {
    pub asset: AssetInfo,
    #[serde(default)]
    pub scene: Option<usize>,
    #[serde(default)]
    pub scenes: Vec<GltfScene>,
    #[serde(default)]
    pub nodes: Vec<GltfNode>,
    #[serde(default)]
    pub meshes: Vec<GltfMesh>,
    #[serde(default)]
    pub accessors: Vec<GltfAccessor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetInfo {
    pub version: String,
    #[serde(default)]
    pub generator: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GltfScene {
    #[serde(default)]
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GltfNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mesh: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GltfMesh {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<GltfPrimitive>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GltfPrimitive {
    #[serde(default)]
    pub attributes: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GltfAccessor {
    #[serde(default)]
    pub min: Option<Vec<f64>>,
    #[serde(default)]
    pub max: Option<Vec<f64>>,
}

impl GltfDocument {
    pub fn from_slice(json: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(json)
    }

    /// Major version from `asset.version` ("2.0" -> 2).
    pub fn major_version(&self) -> Option<u32> {
        self.asset.version.split('.').next()?.parse().ok()
    }

    /// Accessor indices of every primitive's `POSITION` attribute.
    pub fn position_accessors(&self) -> impl Iterator<Item = usize> + '_ {
        self.meshes
            .iter()
            .flat_map(|m| m.primitives.iter())
            .filter_map(|p| p.attributes.get("POSITION").copied())
    }
}

use std::fmt;
use std::str::FromStr;

use foundation::math::Vec3;
use scene::components::{AssetId, ComponentBounds};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::glb::parse_glb;
use crate::gltf::GltfDocument;

/// Container format of a 3D model.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// glTF JSON (external or embedded buffers).
    Gltf,
    /// Binary glTF container.
    Glb,
}

impl ModelFormat {
    /// Guesses the format from a file extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.')?.1;
        ext.parse().ok()
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFormat::Gltf => write!(f, "gltf"),
            ModelFormat::Glb => write!(f, "glb"),
        }
    }
}

impl FromStr for ModelFormat {
    type Err = AssetDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gltf" => Ok(ModelFormat::Gltf),
            "glb" => Ok(ModelFormat::Glb),
            other => Err(AssetDecodeError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum AssetDecodeError {
    #[error("unknown model format: {0}")]
    UnknownFormat(String),
    #[error("not a GLB container (magic {0:#010x})")]
    BadMagic(u32),
    #[error("unsupported glTF version: {0}")]
    UnsupportedVersion(String),
    #[error("truncated asset: needed {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("GLB container does not start with a JSON chunk")]
    MissingJsonChunk,
    #[error("glTF JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("accessor {0} referenced by a mesh does not exist")]
    DanglingAccessor(usize),
    #[error("asset contains no meshes")]
    NoMeshes,
}

/// Validated summary of a decoded model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub format: ModelFormat,
    pub meshes: usize,
    pub nodes: usize,
    pub generator: Option<String>,
    /// Union of the POSITION accessor extents, when the asset declares them.
    pub bounds: Option<ComponentBounds>,
    /// blake3 of the raw bytes, hex encoded.
    pub content_hash: String,
}

impl ModelAsset {
    /// Stable id derived from the content hash.
    pub fn asset_id(&self) -> AssetId {
        let prefix = self.content_hash.get(..16).unwrap_or("0");
        AssetId(u64::from_str_radix(prefix, 16).unwrap_or_default())
    }
}

pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Validates `bytes` as a glTF 2.0 model of the given container format.
pub fn decode_model(bytes: &[u8], format: ModelFormat) -> Result<ModelAsset, AssetDecodeError> {
    let document = match format {
        ModelFormat::Glb => GltfDocument::from_slice(parse_glb(bytes)?.json)?,
        ModelFormat::Gltf => GltfDocument::from_slice(bytes)?,
    };

    if document.major_version() != Some(2) {
        return Err(AssetDecodeError::UnsupportedVersion(
            document.asset.version.clone(),
        ));
    }
    if document.meshes.is_empty() {
        return Err(AssetDecodeError::NoMeshes);
    }

    let bounds = position_bounds(&document)?;

    Ok(ModelAsset {
        format,
        meshes: document.meshes.len(),
        nodes: document.nodes.len(),
        generator: document.asset.generator.clone(),
        bounds,
        content_hash: content_hash(bytes),
    })
}

fn position_bounds(document: &GltfDocument) -> Result<Option<ComponentBounds>, AssetDecodeError> {
    let mut out: Option<ComponentBounds> = None;
    for index in document.position_accessors() {
        let accessor = document
            .accessors
            .get(index)
            .ok_or(AssetDecodeError::DanglingAccessor(index))?;
        let (Some(min), Some(max)) = (vec3(&accessor.min), vec3(&accessor.max)) else {
            continue;
        };
        out = Some(match out {
            None => ComponentBounds::new(min, max),
            Some(b) => ComponentBounds::new(
                Vec3::new(b.min.x.min(min.x), b.min.y.min(min.y), b.min.z.min(min.z)),
                Vec3::new(b.max.x.max(max.x), b.max.y.max(max.y), b.max.z.max(max.z)),
            ),
        });
    }
    Ok(out)
}

fn vec3(values: &Option<Vec<f64>>) -> Option<Vec3> {
    match values.as_deref() {
        Some([x, y, z, ..]) => Some(Vec3::new(*x, *y, *z)),
        _ => None,
    }
}

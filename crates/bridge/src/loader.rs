use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::AssetLoadError;

/// Source of raw model bytes, addressed by a relative asset path.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    async fn load(&self, asset: &str) -> Result<Vec<u8>, AssetLoadError>;
}

/// Reads assets from a directory, like a static file server would.
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `asset` under the root. Leading slashes are ignored; paths that
    /// would escape the root resolve to nothing.
    fn resolve(&self, asset: &str) -> Option<PathBuf> {
        let relative = Path::new(asset.trim_start_matches('/'));
        let normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        (normal && !asset.trim_start_matches('/').is_empty()).then(|| self.root.join(relative))
    }
}

#[async_trait]
impl AssetLoader for FsAssetLoader {
    async fn load(&self, asset: &str) -> Result<Vec<u8>, AssetLoadError> {
        let path = self
            .resolve(asset)
            .ok_or_else(|| AssetLoadError::NotFound(asset.to_string()))?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                tracing::debug!(asset, path = %path.display(), bytes = bytes.len(), "asset read");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetLoadError::NotFound(asset.to_string()))
            }
            Err(source) => Err(AssetLoadError::Io {
                asset: asset.to_string(),
                source,
            }),
        }
    }
}

/// In-memory assets.
#[derive(Debug, Clone, Default)]
pub struct StaticAssetLoader {
    assets: HashMap<String, Vec<u8>>,
}

impl StaticAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, asset: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(asset, bytes);
        self
    }

    pub fn insert(&mut self, asset: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(asset.into(), bytes.into());
    }
}

#[async_trait]
impl AssetLoader for StaticAssetLoader {
    async fn load(&self, asset: &str) -> Result<Vec<u8>, AssetLoadError> {
        self.assets
            .get(asset.trim_start_matches('/'))
            .or_else(|| self.assets.get(asset))
            .cloned()
            .ok_or_else(|| AssetLoadError::NotFound(asset.to_string()))
    }
}

use formats::AssetDecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to read asset {asset}: {source}")]
    Io {
        asset: String,
        #[source]
        source: std::io::Error,
    },
    /// The bytes are not the container the format tag promised.
    #[error("asset {asset} is not a valid container: {source}")]
    Format {
        asset: String,
        #[source]
        source: AssetDecodeError,
    },
    /// The container is fine but its glTF content is not usable.
    #[error("failed to decode asset {asset}: {source}")]
    Decode {
        asset: String,
        #[source]
        source: AssetDecodeError,
    },
}

impl AssetLoadError {
    pub(crate) fn from_decode(asset: &str, source: AssetDecodeError) -> Self {
        let asset = asset.to_string();
        match source {
            AssetDecodeError::UnknownFormat(_)
            | AssetDecodeError::BadMagic(_)
            | AssetDecodeError::Truncated { .. }
            | AssetDecodeError::MissingJsonChunk => AssetLoadError::Format { asset, source },
            _ => AssetLoadError::Decode { asset, source },
        }
    }
}

use thiserror::Error;

use crate::layer::{LayerError, LayerId};

#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The surface could not be created. Fatal; there is nothing to retry.
    #[error("map surface failed to initialize: {0}")]
    Initialization(String),
    #[error("style has not finished loading")]
    StyleNotLoaded,
    #[error("a layer with id {0} is already registered")]
    DuplicateLayer(LayerId),
    #[error("layer {id} failed to attach: {source}")]
    LayerSetup {
        id: LayerId,
        #[source]
        source: LayerError,
    },
    #[error("map surface has been torn down")]
    TornDown,
}

use std::fmt;

use gpu::{DrawError, SharedCanvas};
use runtime::Telemetry;
use thiserror::Error;

use crate::view::CameraBinding;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Error)]
pub enum LayerError {
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error("{0}")]
    Failed(String),
}

/// What a layer gets to see while it is being added.
///
/// Only the surface can build one, and only for the duration of
/// [`CustomLayer::on_add`]; anything a layer wants to keep must be cloned
/// out of it.
pub struct SurfaceContext<'a> {
    canvas: &'a SharedCanvas,
    camera: &'a CameraBinding,
    telemetry: &'a Telemetry,
    antialias: bool,
}

impl<'a> SurfaceContext<'a> {
    pub(crate) fn new(
        canvas: &'a SharedCanvas,
        camera: &'a CameraBinding,
        telemetry: &'a Telemetry,
        antialias: bool,
    ) -> Self {
        Self {
            canvas,
            camera,
            telemetry,
            antialias,
        }
    }

    pub fn canvas(&self) -> SharedCanvas {
        self.canvas.clone()
    }

    pub fn camera(&self) -> CameraBinding {
        self.camera.clone()
    }

    pub fn telemetry(&self) -> Telemetry {
        self.telemetry.clone()
    }

    pub fn antialias(&self) -> bool {
        self.antialias
    }
}

/// A layer drawn by the surface's redraw loop.
pub trait CustomLayer {
    fn id(&self) -> LayerId;

    /// Called once, synchronously, from `register_layer`. An error leaves
    /// the layer unregistered.
    fn on_add(&mut self, ctx: &mut SurfaceContext<'_>) -> Result<(), LayerError>;

    /// Called every frame, in registration order.
    fn render(&mut self) -> Result<(), LayerError>;

    /// Called once when the layer is removed or the surface torn down.
    fn on_remove(&mut self) {}
}

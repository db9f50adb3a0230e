use std::sync::Arc;

use foundation::GeoCoordinate;
use gpu::MapCameraView;
use parking_lot::RwLock;
use runtime::Frame;

/// Camera state of the 2D map.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapViewState {
    pub center: GeoCoordinate,
    pub zoom: f64,
    pub pitch: f64,
    /// Degrees clockwise from north, in [0, 360).
    pub bearing: f64,
    pub viewport_px: (u32, u32),
}

impl MapViewState {
    pub fn camera_view(&self) -> MapCameraView {
        MapCameraView {
            center: self.center,
            zoom: self.zoom,
            pitch_deg: self.pitch,
            bearing_deg: self.bearing,
            viewport_px: self.viewport_px,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Published {
    view: MapViewState,
    frame: Frame,
}

/// Read-only window onto the camera the surface last rendered with.
///
/// The surface publishes view and frame together at the start of every
/// frame, so a reader never sees a view from one frame paired with the
/// index of another.
#[derive(Debug, Clone)]
pub struct CameraBinding {
    inner: Arc<RwLock<Published>>,
}

impl CameraBinding {
    pub(crate) fn new(view: MapViewState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Published {
                view,
                frame: Frame::before_first(),
            })),
        }
    }

    pub(crate) fn publish(&self, view: MapViewState, frame: Frame) {
        *self.inner.write() = Published { view, frame };
    }

    pub fn view(&self) -> MapViewState {
        self.inner.read().view
    }

    pub fn frame(&self) -> Frame {
        self.inner.read().frame
    }

    pub fn snapshot(&self) -> (MapViewState, Frame) {
        let published = *self.inner.read();
        (published.view, published.frame)
    }
}

use std::panic::{AssertUnwindSafe, catch_unwind};

use foundation::math::{Vec2, geo_from_mercator, mercator_from_geo, mercator_m_per_px};
use foundation::{GeoCoordinate, Heading};
use gpu::SharedCanvas;
use runtime::{Frame, Telemetry, kinds, names};

use crate::config::{MAX_PITCH_DEG, MAX_ZOOM, MIN_ZOOM, MapConfig};
use crate::container::Container;
use crate::error::SurfaceError;
use crate::layer::{CustomLayer, LayerId, SurfaceContext};
use crate::view::{CameraBinding, MapViewState};

type ReadyCallback = Box<dyn FnOnce(&mut MapSurface)>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceState {
    /// Created; the style is still loading.
    Loading,
    /// Style loaded; custom layers may be registered.
    Ready,
    TornDown,
}

/// Partial camera move; unset fields keep their current value.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CameraOptions {
    pub center: Option<GeoCoordinate>,
    pub zoom: Option<f64>,
    pub pitch: Option<f64>,
    pub bearing: Option<f64>,
}

/// Outcome of one pass of the redraw loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub frame_index: u64,
    pub layers_rendered: usize,
    pub layer_errors: usize,
    pub layer_panics: usize,
}

pub struct MapSurface {
    config: MapConfig,
    state: SurfaceState,
    view: MapViewState,
    binding: CameraBinding,
    canvas: Option<SharedCanvas>,
    layers: Vec<Box<dyn CustomLayer>>,
    on_ready: Vec<ReadyCallback>,
    frame: Frame,
    telemetry: Telemetry,
}

impl MapSurface {
    pub fn initialize(config: MapConfig, container: &mut dyn Container) -> Result<Self, SurfaceError> {
        Self::initialize_with_telemetry(config, container, Telemetry::new())
    }

    pub fn initialize_with_telemetry(
        config: MapConfig,
        container: &mut dyn Container,
        telemetry: Telemetry,
    ) -> Result<Self, SurfaceError> {
        config.validate()?;

        let canvas = container
            .acquire_canvas()
            .map_err(|e| SurfaceError::Initialization(e.to_string()))?;
        let viewport_px = canvas.lock().size_px();
        if viewport_px.0 == 0 || viewport_px.1 == 0 {
            return Err(SurfaceError::Initialization(format!(
                "canvas has zero size ({}x{})",
                viewport_px.0, viewport_px.1
            )));
        }

        let view = MapViewState {
            center: config.center,
            zoom: config.zoom,
            pitch: config.pitch,
            bearing: Heading::from_degrees(config.bearing)
                .map(Heading::degrees)
                .unwrap_or(0.0),
            viewport_px,
        };

        tracing::info!(
            style = %config.style,
            lon = view.center.longitude(),
            lat = view.center.latitude(),
            zoom = view.zoom,
            pitch = view.pitch,
            width = viewport_px.0,
            height = viewport_px.1,
            "map surface initialized"
        );

        Ok(Self {
            config,
            state: SurfaceState::Loading,
            view,
            binding: CameraBinding::new(view),
            canvas: Some(canvas),
            layers: Vec::new(),
            on_ready: Vec::new(),
            frame: Frame::before_first(),
            telemetry,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SurfaceState::Ready
    }

    pub fn view(&self) -> MapViewState {
        self.view
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn telemetry(&self) -> Telemetry {
        self.telemetry.clone()
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id()).collect()
    }

    /// Runs `callback` once the style has loaded, or right away if it
    /// already has. Ignored after teardown.
    pub fn on_ready(&mut self, callback: impl FnOnce(&mut MapSurface) + 'static) {
        match self.state {
            SurfaceState::Ready => callback(self),
            SurfaceState::Loading => self.on_ready.push(Box::new(callback)),
            SurfaceState::TornDown => {
                tracing::debug!("on_ready after teardown ignored");
            }
        }
    }

    /// Style finished loading. Pending ready callbacks run in registration
    /// order; callbacks that already ran never run again.
    pub fn notify_style_loaded(&mut self) {
        match self.state {
            SurfaceState::TornDown => return,
            SurfaceState::Loading => {
                self.state = SurfaceState::Ready;
                tracing::info!(style = %self.config.style, "style loaded");
            }
            SurfaceState::Ready => {
                tracing::debug!(style = %self.config.style, "style reloaded");
            }
        }

        for callback in std::mem::take(&mut self.on_ready) {
            callback(self);
        }
    }

    pub fn register_layer(&mut self, layer: impl CustomLayer + 'static) -> Result<LayerId, SurfaceError> {
        self.register_boxed_layer(Box::new(layer))
    }

    pub fn register_boxed_layer(
        &mut self,
        mut layer: Box<dyn CustomLayer>,
    ) -> Result<LayerId, SurfaceError> {
        match self.state {
            SurfaceState::TornDown => return Err(SurfaceError::TornDown),
            SurfaceState::Loading => return Err(SurfaceError::StyleNotLoaded),
            SurfaceState::Ready => {}
        }
        let id = layer.id();
        if self.layers.iter().any(|l| l.id() == id) {
            return Err(SurfaceError::DuplicateLayer(id));
        }
        let canvas = self.canvas.as_ref().ok_or(SurfaceError::TornDown)?;

        let mut ctx = SurfaceContext::new(canvas, &self.binding, &self.telemetry, self.config.antialias);
        layer
            .on_add(&mut ctx)
            .map_err(|source| SurfaceError::LayerSetup {
                id: id.clone(),
                source,
            })?;

        self.layers.push(layer);
        self.telemetry
            .set_gauge(names::LAYERS_REGISTERED, self.layers.len() as i64);
        tracing::info!(layer = %id, "layer registered");
        Ok(id)
    }

    /// Removes a layer, calling its `on_remove`. Returns `false` if no
    /// layer has that id.
    pub fn remove_layer(&mut self, id: &LayerId) -> bool {
        let Some(pos) = self.layers.iter().position(|l| &l.id() == id) else {
            return false;
        };
        let mut layer = self.layers.remove(pos);
        layer.on_remove();
        self.telemetry
            .set_gauge(names::LAYERS_REGISTERED, self.layers.len() as i64);
        tracing::info!(layer = %id, "layer removed");
        true
    }

    /// One pass of the redraw loop: advance the frame, publish the camera,
    /// render every layer in registration order.
    ///
    /// Layer failures are contained here: errors and panics are logged,
    /// recorded and counted, and the remaining layers still render.
    pub fn render_frame(&mut self, dt_s: f64) -> Result<FrameReport, SurfaceError> {
        if self.state == SurfaceState::TornDown {
            return Err(SurfaceError::TornDown);
        }

        self.frame = self.frame.advance(dt_s);
        self.telemetry.set_frame(self.frame);
        self.binding.publish(self.view, self.frame);

        let mut report = FrameReport {
            frame_index: self.frame.index,
            ..FrameReport::default()
        };

        for layer in self.layers.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| layer.render())) {
                Ok(Ok(())) => report.layers_rendered += 1,
                Ok(Err(err)) => {
                    report.layer_errors += 1;
                    let id = layer.id();
                    tracing::warn!(layer = %id, frame = self.frame.index, error = %err, "layer render failed");
                    self.telemetry
                        .emit(kinds::RENDER_ERROR, format!("{id}: {err}"));
                    self.telemetry.inc(names::FRAME_RENDER_ERRORS, 1);
                }
                Err(panic) => {
                    report.layer_panics += 1;
                    let id = layer.id();
                    let message = panic_message(panic.as_ref());
                    tracing::error!(layer = %id, frame = self.frame.index, panic = %message, "layer render panicked");
                    self.telemetry
                        .emit(kinds::RENDER_PANIC, format!("{id}: {message}"));
                    self.telemetry.inc(names::FRAME_RENDER_ERRORS, 1);
                }
            }
        }

        self.telemetry.inc(names::FRAMES_RENDERED, 1);
        Ok(report)
    }

    pub fn jump_to(&mut self, options: CameraOptions) {
        if let Some(center) = options.center {
            self.view.center = center;
        }
        if let Some(zoom) = options.zoom {
            self.set_zoom(zoom);
        }
        if let Some(pitch) = options.pitch {
            self.set_pitch(pitch);
        }
        if let Some(bearing) = options.bearing {
            self.set_bearing(bearing);
        }
    }

    pub fn set_center(&mut self, center: GeoCoordinate) {
        self.view.center = center;
    }

    /// Clamped to the supported zoom range; non-finite input is ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.view.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        if pitch.is_finite() {
            self.view.pitch = pitch.clamp(0.0, MAX_PITCH_DEG);
        }
    }

    pub fn set_bearing(&mut self, bearing: f64) {
        if let Ok(heading) = Heading::from_degrees(bearing) {
            self.view.bearing = heading.degrees();
        }
    }

    /// Moves the center by a screen-space offset (x right, y down), as a
    /// drag would. Respects the current bearing.
    pub fn pan_by(&mut self, dx_px: f64, dy_px: f64) {
        if !dx_px.is_finite() || !dy_px.is_finite() {
            return;
        }
        let m_per_px = mercator_m_per_px(self.view.zoom);
        let b = self.view.bearing.to_radians();
        // Screen right and screen up, in mercator space.
        let right = Vec2::new(b.cos(), -b.sin());
        let up = Vec2::new(b.sin(), b.cos());
        let dx = dx_px * m_per_px;
        let dy = -dy_px * m_per_px;
        let center = mercator_from_geo(self.view.center);
        let moved = Vec2::new(
            center.x + right.x * dx + up.x * dy,
            center.y + right.y * dx + up.y * dy,
        );
        self.view.center = geo_from_mercator(moved);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.view.viewport_px = (width, height);
        }
    }

    /// Removes every layer and releases the canvas. Safe to call more than
    /// once; also runs on drop.
    pub fn teardown(&mut self) {
        if self.state == SurfaceState::TornDown {
            return;
        }
        for layer in self.layers.iter_mut() {
            layer.on_remove();
        }
        let removed = self.layers.len();
        self.layers.clear();
        self.on_ready.clear();
        self.canvas = None;
        self.state = SurfaceState::TornDown;
        self.telemetry.set_gauge(names::LAYERS_REGISTERED, 0);
        tracing::info!(layers = removed, frames = self.frame.index, "map surface torn down");
    }
}

impl Drop for MapSurface {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

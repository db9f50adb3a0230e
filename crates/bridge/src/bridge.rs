use std::fmt;
use std::sync::Arc;

use formats::decode_model;
use gpu::{Camera3D, DrawError, Light, Renderer, SharedCanvas, default_light_rig};
use map::{CameraBinding, SurfaceContext};
use parking_lot::Mutex;
use runtime::{Telemetry, kinds, names};
use scene::World;
use scene::components::{ComponentProperties, Drawable3D, Visibility};
use tokio_util::sync::CancellationToken;

use crate::error::AssetLoadError;
use crate::loader::AssetLoader;
use crate::object::{ObjectSpec, VehicleObject};

#[derive(Clone)]
pub struct BridgeOptions {
    /// Add an ambient plus directional light rig to every frame.
    pub default_lights: bool,
    pub loader: Arc<dyn AssetLoader>,
}

impl BridgeOptions {
    pub fn new(loader: impl AssetLoader + 'static) -> Self {
        Self {
            default_lights: true,
            loader: Arc::new(loader),
        }
    }
}

impl fmt::Debug for BridgeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeOptions")
            .field("default_lights", &self.default_lights)
            .finish_non_exhaustive()
    }
}

/// How an asset load ended, short of an error.
#[derive(Debug)]
pub enum LoadOutcome {
    Ready(VehicleObject),
    /// The bridge was torn down before or during the load; nothing was
    /// added to the scene.
    Cancelled,
}

impl LoadOutcome {
    pub fn ready(self) -> Option<VehicleObject> {
        match self {
            LoadOutcome::Ready(object) => Some(object),
            LoadOutcome::Cancelled => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub frame_index: u64,
    pub draw_commands: usize,
    /// `false` when the bridge was already cancelled and nothing was drawn.
    pub submitted: bool,
}

struct BridgeShared {
    world: Mutex<World>,
    canvas: SharedCanvas,
    camera: CameraBinding,
    telemetry: Telemetry,
    lights: Vec<Light>,
    loader: Arc<dyn AssetLoader>,
    cancel: CancellationToken,
}

/// Handle to a 3D scene that follows a map surface's camera.
///
/// Clones share the same scene. The scene lives as long as any clone does,
/// but after [`SceneBridge::cancel`] it is empty and draws nothing.
#[derive(Clone)]
pub struct SceneBridge {
    inner: Arc<BridgeShared>,
}

impl fmt::Debug for SceneBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneBridge")
            .field("cancelled", &self.is_cancelled())
            .field("objects", &self.object_count())
            .finish_non_exhaustive()
    }
}

impl SceneBridge {
    /// Builds the scene on the surface's canvas and camera. Only possible
    /// while a layer is being added, which is when a context exists.
    pub fn attach(ctx: &mut SurfaceContext<'_>, options: BridgeOptions) -> Self {
        let lights = if options.default_lights {
            default_light_rig()
        } else {
            Vec::new()
        };
        tracing::info!(
            default_lights = options.default_lights,
            antialias = ctx.antialias(),
            "scene bridge attached"
        );
        Self {
            inner: Arc::new(BridgeShared {
                world: Mutex::new(World::new()),
                canvas: ctx.canvas(),
                camera: ctx.camera(),
                telemetry: ctx.telemetry(),
                lights,
                loader: options.loader,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn telemetry(&self) -> Telemetry {
        self.inner.telemetry.clone()
    }

    pub fn camera(&self) -> CameraBinding {
        self.inner.camera.clone()
    }

    pub fn object_count(&self) -> usize {
        self.inner.world.lock().len()
    }

    /// Runs `f` with the scene locked. Keep it short: the render loop
    /// takes the same lock.
    pub(crate) fn with_world<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut self.inner.world.lock())
    }

    /// Loads and decodes `spec.asset`, then creates a hidden object for it.
    ///
    /// Cancellation wins over everything: a bridge torn down before the
    /// load starts, while the bytes are in flight, or before the object is
    /// created yields [`LoadOutcome::Cancelled`] and leaves the scene alone.
    pub async fn load_object(&self, spec: ObjectSpec) -> Result<LoadOutcome, AssetLoadError> {
        if self.is_cancelled() {
            return Ok(self.cancelled_load(&spec));
        }

        let loader = self.inner.loader.clone();
        let bytes = tokio::select! {
            biased;
            _ = self.inner.cancel.cancelled() => return Ok(self.cancelled_load(&spec)),
            bytes = loader.load(&spec.asset) => bytes,
        };
        let bytes = bytes.inspect_err(|e| {
            tracing::error!(asset = %spec.asset, error = %e, "asset load failed");
        })?;

        let model = decode_model(&bytes, spec.format).map_err(|e| {
            let err = AssetLoadError::from_decode(&spec.asset, e);
            tracing::error!(asset = %spec.asset, error = %err, "asset decode failed");
            err
        })?;

        let entity = {
            let mut world = self.inner.world.lock();
            // Checked under the lock: cancel() clears the world under it too.
            if self.is_cancelled() {
                drop(world);
                return Ok(self.cancelled_load(&spec));
            }
            let entity = world.spawn();
            let drawable = Drawable3D {
                scale: spec.scale.into(),
                units: spec.units,
                rotation_offset_deg: spec.rotation_deg.into(),
                pivot: spec.anchor.pivot(model.bounds),
                ..Drawable3D::model(model.asset_id())
            };
            world.set_drawable_3d(entity, drawable);
            world.set_visibility(entity, Visibility::Hidden);
            if let Some(bounds) = model.bounds {
                world.set_bounds(entity, bounds);
            }
            if let Some(tooltip) = &spec.tooltip {
                world.set_properties(entity, ComponentProperties::with_tooltip(tooltip.clone()));
            }
            entity
        };

        tracing::info!(
            asset = %spec.asset,
            format = %spec.format,
            meshes = model.meshes,
            hash = %model.content_hash,
            entity = %entity,
            "asset loaded"
        );
        Ok(LoadOutcome::Ready(VehicleObject::new(self.clone(), entity)))
    }

    fn cancelled_load(&self, spec: &ObjectSpec) -> LoadOutcome {
        tracing::info!(asset = %spec.asset, "asset load cancelled by teardown");
        self.inner
            .telemetry
            .emit(kinds::LOAD_CANCELLED, spec.asset.clone());
        LoadOutcome::Cancelled
    }

    /// Makes `object` visible. Objects start hidden so that nothing is
    /// drawn before its first pose is committed.
    pub fn add_to_scene(&self, object: &VehicleObject) -> bool {
        self.with_world(|w| w.set_visibility(object.entity(), Visibility::Shown))
    }

    /// Re-derives the 3D camera from the map's current view and draws every
    /// visible object once.
    pub fn sync_frame(&self) -> Result<SyncReport, DrawError> {
        let (view, frame) = self.inner.camera.snapshot();
        if self.is_cancelled() {
            return Ok(SyncReport {
                frame_index: frame.index,
                ..SyncReport::default()
            });
        }

        let camera = Camera3D::from_map_view(view.camera_view());
        let mut render = {
            let world = self.inner.world.lock();
            Renderer::collect_3d(&world, camera, frame.index)
        };
        render.lights = self.inner.lights.clone();

        let draw_commands = render.commands.len();
        self.inner
            .telemetry
            .record(names::FRAME_DRAW_COMMANDS, draw_commands as i64);
        tracing::trace!(frame = frame.index, draw_commands, "scene synced");

        self.inner.canvas.lock().submit(render)?;
        Ok(SyncReport {
            frame_index: frame.index,
            draw_commands,
            submitted: true,
        })
    }

    /// Tears the scene down: in-flight loads resolve to `Cancelled` and
    /// every object is removed. Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancel.is_cancelled() {
            return;
        }
        let removed = {
            let mut world = self.inner.world.lock();
            self.inner.cancel.cancel();
            world.clear()
        };
        tracing::info!(removed, "scene bridge cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Child token for work that should stop with this bridge.
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.cancel.child_token()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use foundation::math::{GeoCoordinate, Heading, Vec3};
    use foundation::Pose;
    use formats::{ModelFormat, encode_glb};
    use gpu::{Light, RecordingCanvas, RenderCommand, shared_canvas};
    use map::{HeadlessContainer, MapConfig, MapSurface};
    use runtime::kinds;

    use super::{BridgeOptions, LoadOutcome, SceneBridge};
    use crate::error::AssetLoadError;
    use crate::layer::SceneLayer;
    use crate::loader::{AssetLoader, StaticAssetLoader};
    use crate::object::{AnchorMode, Axes, ObjectSpec};

    const BUS_JSON: &str = r#"{
        "asset": {"version": "2.0"},
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
        "accessors": [{"min": [-1.0, 0.0, -4.0], "max": [1.0, 3.0, 4.0]}]
    }"#;

    /// Never finishes loading.
    struct StalledLoader;

    #[async_trait]
    impl AssetLoader for StalledLoader {
        async fn load(&self, _asset: &str) -> Result<Vec<u8>, AssetLoadError> {
            std::future::pending().await
        }
    }

    fn bus_loader() -> StaticAssetLoader {
        StaticAssetLoader::new()
            .with("models/bus.glb", encode_glb(BUS_JSON.as_bytes(), None))
            .with("models/broken.glb", b"not a model".to_vec())
            .with("models/empty.gltf", br#"{"asset": {"version": "2.0"}}"#.to_vec())
    }

    fn bus_spec() -> ObjectSpec {
        ObjectSpec {
            scale: Axes::splat(0.1),
            rotation_deg: Axes::new(90.0, 90.0, 0.0),
            anchor: AnchorMode::Center,
            tooltip: Some("Bus #123".to_string()),
            ..ObjectSpec::new("models/bus.glb", ModelFormat::Glb)
        }
    }

    fn mount(loader: impl AssetLoader + 'static) -> (MapSurface, RecordingCanvas, SceneBridge) {
        let recorder = RecordingCanvas::new(500, 500);
        let mut container = HeadlessContainer::new(shared_canvas(recorder.clone()));
        let config = MapConfig {
            center: GeoCoordinate::new(90.4125, 23.8103).unwrap(),
            zoom: 18.0,
            pitch: 60.0,
            ..MapConfig::default()
        };
        let mut map = MapSurface::initialize(config, &mut container).expect("initialize");
        map.notify_style_loaded();

        let (layer, mut rx) = SceneLayer::new("3d-bus-layer", BridgeOptions::new(loader));
        map.register_layer(layer).expect("register");
        let bridge = rx.try_recv().expect("bridge handed out on add");
        (map, recorder, bridge)
    }

    fn start() -> Pose {
        Pose::at(GeoCoordinate::new(90.4125, 23.8103).unwrap())
    }

    #[tokio::test]
    async fn loaded_objects_start_hidden_until_added() {
        let (mut map, recorder, bridge) = mount(bus_loader());
        let bus = bridge
            .load_object(bus_spec())
            .await
            .expect("load")
            .ready()
            .expect("not cancelled");
        bus.set_pose(start());
        assert_eq!(bus.tooltip().as_deref(), Some("Bus #123"));
        assert!(!bus.is_visible());

        map.render_frame(1.0 / 60.0).unwrap();
        assert!(recorder.last_frame().unwrap().commands.is_empty());

        assert!(bridge.add_to_scene(&bus));
        map.render_frame(1.0 / 60.0).unwrap();
        let frame = recorder.last_frame().unwrap();
        assert_eq!(frame.frame_index, 2);
        assert_eq!(frame.model_poses(), vec![start()]);
        assert!(matches!(frame.lights.as_slice(), [Light::Ambient { .. }, Light::Directional { .. }]));
        match &frame.commands[0] {
            RenderCommand::DrawModel { transform, label, .. } => {
                assert_eq!(label.as_deref(), Some("Bus #123"));
                // Center anchor of the declared bounds.
                assert_eq!(transform.pivot, Vec3::new(0.0, -1.5, 0.0));
                assert_eq!(transform.rotation_deg, Vec3::new(90.0, 90.0, 0.0));
            }
        }
    }

    #[tokio::test]
    async fn pose_changes_show_up_on_the_next_frame_only() {
        let (mut map, recorder, bridge) = mount(bus_loader());
        let bus = bridge.load_object(bus_spec()).await.unwrap().ready().unwrap();
        bus.set_pose(start());
        bridge.add_to_scene(&bus);
        map.render_frame(0.016).unwrap();

        let moved = Pose::new(GeoCoordinate::new(90.4135, 23.8103).unwrap(), Heading::EAST);
        bus.set_pose(moved);
        assert_eq!(recorder.frame_count(), 1);
        assert_eq!(recorder.last_frame().unwrap().model_poses(), vec![start()]);

        map.render_frame(0.016).unwrap();
        assert_eq!(recorder.last_frame().unwrap().model_poses(), vec![moved]);
    }

    #[tokio::test]
    async fn load_errors_are_classified() {
        let (_map, _recorder, bridge) = mount(bus_loader());

        let missing = ObjectSpec::new("models/car.glb", ModelFormat::Glb);
        assert!(matches!(
            bridge.load_object(missing).await,
            Err(AssetLoadError::NotFound(_))
        ));

        let broken = ObjectSpec::new("models/broken.glb", ModelFormat::Glb);
        assert!(matches!(
            bridge.load_object(broken).await,
            Err(AssetLoadError::Format { .. })
        ));

        let empty = ObjectSpec::new("models/empty.gltf", ModelFormat::Gltf);
        assert!(matches!(
            bridge.load_object(empty).await,
            Err(AssetLoadError::Decode { .. })
        ));
        assert_eq!(bridge.object_count(), 0);
    }

    #[tokio::test]
    async fn load_after_teardown_is_cancelled() {
        let (mut map, _recorder, bridge) = mount(bus_loader());
        map.teardown();
        assert!(bridge.is_cancelled());

        let outcome = bridge.load_object(bus_spec()).await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Cancelled));
        assert_eq!(bridge.object_count(), 0);
        assert_eq!(bridge.telemetry().count_events(kinds::LOAD_CANCELLED), 1);
    }

    #[tokio::test]
    async fn teardown_during_load_cancels_it() {
        let (map, _recorder, bridge) = mount(StalledLoader);
        let map = std::cell::RefCell::new(map);

        let (outcome, ()) = tokio::join!(bridge.load_object(bus_spec()), async {
            tokio::task::yield_now().await;
            map.borrow_mut().teardown();
        });

        assert!(matches!(outcome, Ok(LoadOutcome::Cancelled)));
        assert_eq!(bridge.object_count(), 0);
    }

    #[tokio::test]
    async fn teardown_removes_objects_and_leaves_handles_inert() {
        let (mut map, recorder, bridge) = mount(bus_loader());
        let bus = bridge.load_object(bus_spec()).await.unwrap().ready().unwrap();
        bus.set_pose(start());
        bridge.add_to_scene(&bus);
        map.render_frame(0.016).unwrap();

        map.teardown();
        assert!(!bus.is_alive());
        assert!(!bus.set_pose(start()));
        assert_eq!(bus.pose(), None);
        assert!(!bridge.sync_frame().unwrap().submitted);
        assert_eq!(recorder.frame_count(), 1);
        drop(bus);
        assert_eq!(bridge.object_count(), 0);
    }

    #[tokio::test]
    async fn dropping_the_handle_removes_the_object() {
        let (_map, _recorder, bridge) = mount(bus_loader());
        let bus = bridge.load_object(bus_spec()).await.unwrap().ready().unwrap();
        assert_eq!(bridge.object_count(), 1);
        drop(bus);
        assert_eq!(bridge.object_count(), 0);
    }

    #[tokio::test]
    async fn lights_are_optional() {
        let recorder = RecordingCanvas::new(100, 100);
        let mut container = HeadlessContainer::new(shared_canvas(recorder.clone()));
        let mut map = MapSurface::initialize(MapConfig::default(), &mut container).unwrap();
        map.notify_style_loaded();
        let options = BridgeOptions {
            default_lights: false,
            loader: Arc::new(bus_loader()),
        };
        let (layer, mut rx) = SceneLayer::new("unlit", options);
        map.register_layer(layer).unwrap();
        let bridge = rx.try_recv().unwrap();

        let report = bridge.sync_frame().unwrap();
        assert!(report.submitted);
        assert!(recorder.last_frame().unwrap().lights.is_empty());
    }
}

use bridge::{SceneBridge, VehicleObject};
use foundation::{GeoCoordinate, Heading, Pose};
use runtime::{Telemetry, kinds, names};
use scene::components::Placement;
use serde::{Deserialize, Serialize};

use crate::motion::{MotionMode, Tween};

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerOptions {
    #[serde(default)]
    pub motion: MotionMode,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The fix is now the committed pose.
    Applied { pose: Pose },
    /// Nothing to move yet (or any more); the fix was discarded.
    Dropped,
}

/// Owns the tracked vehicle's scene object and moves it fix by fix.
///
/// Fixes are applied in the order they arrive and each one replaces the
/// last; there is no queue. What the scene draws is whatever was committed
/// when the next frame renders.
#[derive(Debug)]
pub struct PoseController {
    bridge: SceneBridge,
    options: ControllerOptions,
    object: Option<VehicleObject>,
    tween: Option<Tween>,
    telemetry: Telemetry,
}

impl PoseController {
    pub fn new(bridge: SceneBridge, options: ControllerOptions) -> Self {
        let telemetry = bridge.telemetry();
        Self {
            bridge,
            options,
            object: None,
            tween: None,
            telemetry,
        }
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    pub fn bridge(&self) -> &SceneBridge {
        &self.bridge
    }

    pub fn is_bound(&self) -> bool {
        self.object.is_some()
    }

    /// Takes ownership of the loaded object and commits the starting pose.
    /// A previously bound object is released (and so removed from the
    /// scene).
    pub fn bind(&mut self, object: VehicleObject, position: GeoCoordinate, heading: Heading) {
        let pose = Pose::new(position, heading);
        object.set_pose(pose);
        if self.object.replace(object).is_some() {
            tracing::warn!("controller rebound; previous object released");
        }
        self.tween = None;
        tracing::info!(
            lon = position.longitude(),
            lat = position.latitude(),
            heading = heading.degrees(),
            "vehicle bound"
        );
    }

    /// Committed pose of the bound object.
    pub fn pose(&self) -> Option<Pose> {
        self.object.as_ref().and_then(VehicleObject::pose)
    }

    /// Pose the next frame will draw.
    pub fn displayed_pose(&self) -> Option<Pose> {
        self.object.as_ref().and_then(VehicleObject::displayed_pose)
    }

    pub fn object(&self) -> Option<&VehicleObject> {
        self.object.as_ref()
    }

    /// Moves the vehicle to `fix`, facing along the great circle from the
    /// committed pose. A fix that repeats the committed position keeps the
    /// current heading.
    pub fn update(&mut self, fix: GeoCoordinate) -> UpdateOutcome {
        let Some(object) = &self.object else {
            return self.drop_fix(fix, "no vehicle bound");
        };
        let Some(current) = object.placement() else {
            return self.drop_fix(fix, "vehicle removed from scene");
        };

        let target = current.committed.advanced_to(fix);
        let committed = match self.options.motion {
            MotionMode::Interpolate { duration_s } if duration_s > 0.0 => {
                let tween = Tween::new(current.displayed, target, duration_s);
                let placement = Placement {
                    committed: target,
                    displayed: tween.current(),
                };
                let written = object.set_placement(placement);
                self.tween = written.then_some(tween);
                written
            }
            _ => object.set_pose(target),
        };
        if !committed {
            return self.drop_fix(fix, "vehicle removed from scene");
        }

        let step_m = current.committed.position.distance_m(&fix);
        self.telemetry.inc(names::FIXES_APPLIED, 1);
        self.telemetry.record(names::FIX_STEP_M, step_m.round() as i64);
        tracing::debug!(
            lon = fix.longitude(),
            lat = fix.latitude(),
            heading = target.heading.degrees(),
            step_m,
            "pose committed"
        );
        UpdateOutcome::Applied { pose: target }
    }

    /// Steps an in-flight glide by `dt_s` and returns the pose to draw.
    /// A no-op in snap mode.
    pub fn advance(&mut self, dt_s: f64) -> Option<Pose> {
        let object = self.object.as_ref()?;
        let Some(tween) = self.tween.as_mut() else {
            return object.displayed_pose();
        };
        let shown = tween.advance(dt_s);
        object.set_placement(Placement {
            committed: tween.to,
            displayed: shown,
        });
        if tween.is_finished() {
            self.tween = None;
        }
        Some(shown)
    }

    /// Releases the bound object.
    pub fn unbind(&mut self) -> Option<VehicleObject> {
        self.tween = None;
        self.object.take()
    }

    fn drop_fix(&self, fix: GeoCoordinate, reason: &str) -> UpdateOutcome {
        tracing::warn!(lon = fix.longitude(), lat = fix.latitude(), reason, "fix dropped");
        self.telemetry.emit(
            kinds::FIX_DROPPED,
            format!("({}, {}): {reason}", fix.longitude(), fix.latitude()),
        );
        self.telemetry.inc(names::FIXES_DROPPED, 1);
        UpdateOutcome::Dropped
    }
}

#[cfg(test)]
mod tests {
    use bridge::{BridgeOptions, ObjectSpec, SceneBridge, SceneLayer, StaticAssetLoader};
    use foundation::{GeoCoordinate, Heading, Pose};
    use formats::{ModelFormat, encode_glb};
    use gpu::{RecordingCanvas, shared_canvas};
    use map::{HeadlessContainer, MapConfig, MapSurface};
    use runtime::{kinds, names};

    use super::{ControllerOptions, PoseController, UpdateOutcome};
    use crate::motion::MotionMode;

    const MODEL: &str = r#"{"asset": {"version": "2.0"}, "meshes": [{}]}"#;

    fn geo(lon: f64, lat: f64) -> GeoCoordinate {
        GeoCoordinate::new(lon, lat).unwrap()
    }

    fn mount() -> (MapSurface, SceneBridge) {
        let mut container = HeadlessContainer::new(shared_canvas(RecordingCanvas::new(500, 500)));
        let mut map = MapSurface::initialize(MapConfig::default(), &mut container).unwrap();
        map.notify_style_loaded();
        let loader = StaticAssetLoader::new().with("bus.glb", encode_glb(MODEL.as_bytes(), None));
        let (layer, mut rx) = SceneLayer::new("vehicles", BridgeOptions::new(loader));
        map.register_layer(layer).unwrap();
        (map, rx.try_recv().unwrap())
    }

    async fn bound(options: ControllerOptions, start: GeoCoordinate) -> (MapSurface, PoseController) {
        let (map, bridge) = mount();
        let object = bridge
            .load_object(ObjectSpec::new("bus.glb", ModelFormat::Glb))
            .await
            .unwrap()
            .ready()
            .unwrap();
        bridge.add_to_scene(&object);
        let mut controller = PoseController::new(bridge, options);
        controller.bind(object, start, Heading::NORTH);
        (map, controller)
    }

    fn heading_of(outcome: UpdateOutcome) -> f64 {
        match outcome {
            UpdateOutcome::Applied { pose } => pose.heading.degrees(),
            UpdateOutcome::Dropped => panic!("fix was dropped"),
        }
    }

    #[test]
    fn update_before_bind_is_a_recorded_no_op() {
        let (_map, bridge) = mount();
        let telemetry = bridge.telemetry();
        let mut controller = PoseController::new(bridge, ControllerOptions::default());

        assert_eq!(controller.update(geo(90.4125, 23.8103)), UpdateOutcome::Dropped);
        assert!(!controller.is_bound());
        assert_eq!(controller.pose(), None);
        assert_eq!(controller.advance(0.1), None);
        assert_eq!(telemetry.count_events(kinds::FIX_DROPPED), 1);
        assert_eq!(telemetry.counter(names::FIXES_DROPPED), 1);
        assert_eq!(telemetry.counter(names::FIXES_APPLIED), 0);
    }

    #[tokio::test]
    async fn heading_follows_the_direction_of_travel() {
        let (_map, mut c) = bound(ControllerOptions::default(), geo(0.0, 0.0)).await;
        assert!((heading_of(c.update(geo(0.001, 0.0))) - 90.0).abs() < 1e-6);
        assert!(heading_of(c.update(geo(0.001, 0.001))).abs() < 1e-6);
        assert!((heading_of(c.update(geo(0.001, 0.0))) - 180.0).abs() < 1e-6);
        assert!((heading_of(c.update(geo(0.0, 0.0))) - 270.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn repeated_fix_keeps_heading() {
        let (_map, mut c) = bound(ControllerOptions::default(), geo(90.4125, 23.8103)).await;
        let fix = geo(90.4135, 23.8113);
        let first = heading_of(c.update(fix));
        let second = heading_of(c.update(fix));
        assert_eq!(first, second);
        assert_eq!(c.pose().unwrap().position, fix);
    }

    #[tokio::test]
    async fn last_fix_wins() {
        let (_map, mut c) = bound(ControllerOptions::default(), geo(90.4125, 23.8103)).await;
        let (f1, f2, f3) = (geo(90.4130, 23.8103), geo(90.4130, 23.8110), geo(90.4120, 23.8115));
        c.update(f1);
        c.update(f2);
        c.update(f3);
        let pose = c.pose().unwrap();
        assert_eq!(pose.position, f3);
        assert_eq!(Some(pose.heading), f2.bearing_to(&f3));
        assert_eq!(c.displayed_pose(), Some(pose));
        assert_eq!(c.bridge().telemetry().counter(names::FIXES_APPLIED), 3);
    }

    #[tokio::test]
    async fn interpolation_commits_target_and_glides_the_display() {
        let options = ControllerOptions {
            motion: MotionMode::Interpolate { duration_s: 1.0 },
        };
        let start = geo(90.4125, 23.8103);
        let (_map, mut c) = bound(options, start).await;

        let target = geo(90.4135, 23.8103);
        let outcome = c.update(target);
        let committed = c.pose().unwrap();
        assert_eq!(outcome, UpdateOutcome::Applied { pose: committed });
        assert_eq!(committed.position, target);
        // Nothing has moved on screen yet.
        assert_eq!(c.displayed_pose().unwrap(), Pose::at(start));

        let halfway = c.advance(0.5).unwrap();
        assert!(halfway.position.longitude() > 90.4125);
        assert!(halfway.position.longitude() < 90.4135);
        assert_eq!(c.pose(), Some(committed));

        assert_eq!(c.advance(0.5), Some(committed));
        assert_eq!(c.displayed_pose(), Some(committed));
        // Settled: further frames change nothing.
        assert_eq!(c.advance(0.5), Some(committed));
    }

    #[tokio::test]
    async fn interpolation_uses_committed_pose_as_heading_reference() {
        let options = ControllerOptions {
            motion: MotionMode::Interpolate { duration_s: 1.0 },
        };
        let (_map, mut c) = bound(options, geo(0.0, 0.0)).await;
        c.update(geo(0.001, 0.0));
        c.advance(0.25);
        // Heading is measured from the committed fix, not the mid-glide pose.
        let heading = heading_of(c.update(geo(0.001, 0.001)));
        assert!(heading.abs() < 1e-6);
    }

    #[tokio::test]
    async fn fixes_after_teardown_are_dropped() {
        let (mut map, mut c) = bound(ControllerOptions::default(), geo(0.0, 0.0)).await;
        map.teardown();
        assert_eq!(c.update(geo(0.001, 0.0)), UpdateOutcome::Dropped);
        assert_eq!(c.bridge().telemetry().count_events(kinds::FIX_DROPPED), 1);
    }

    #[tokio::test]
    async fn rebinding_releases_the_previous_object() {
        let (_map, mut c) = bound(ControllerOptions::default(), geo(0.0, 0.0)).await;
        let bridge = c.bridge().clone();
        let second = bridge
            .load_object(ObjectSpec::new("bus.glb", ModelFormat::Glb))
            .await
            .unwrap()
            .ready()
            .unwrap();
        assert_eq!(bridge.object_count(), 2);
        c.bind(second, geo(1.0, 1.0), Heading::EAST);
        assert_eq!(bridge.object_count(), 1);
        assert_eq!(c.pose(), Some(Pose::new(geo(1.0, 1.0), Heading::EAST)));
    }
}

mod canvas;
mod cli;
mod config;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use bridge::{BridgeOptions, FsAssetLoader, LoadOutcome, SceneLayer};
use clap::Parser;
use foundation::{GeoCoordinate, Heading};
use gpu::shared_canvas;
use map::{HeadlessContainer, MapSurface};
use runtime::Telemetry;
use tokio::io::BufReader;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracking::{FixSource, JsonLinesFixSource, OrbitFixSource, PoseController, UpdateOutcome};

use crate::canvas::LoggingCanvas;
use crate::cli::Cli;
use crate::config::{SourceKind, TrackerConfig};

const SCENE_LAYER_ID: &str = "vehicle-3d";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().resolve()?;
    run(config).await
}

async fn run(config: TrackerConfig) -> anyhow::Result<()> {
    if config.map.access_token.is_none() {
        warn!("no style access token configured; tiles would not load against a live provider");
    }

    let canvas = LoggingCanvas::new(config.viewport_px, u64::from(config.fps));
    let mut container = HeadlessContainer::new(shared_canvas(canvas));
    let mut map = MapSurface::initialize(config.map.clone(), &mut container)
        .context("initializing map surface")?;
    let telemetry = map.telemetry();

    let options = BridgeOptions::new(FsAssetLoader::new(config.asset_root.clone()));
    let (layer, bridge_rx) = SceneLayer::new(SCENE_LAYER_ID, options);
    map.on_ready(move |map| {
        if let Err(e) = map.register_layer(layer) {
            error!(error = %e, "scene layer registration failed");
        }
    });
    // The headless surface has no remote style to wait for.
    map.notify_style_loaded();
    let bridge = bridge_rx.await.context("scene layer was never added")?;

    let mut controller = PoseController::new(bridge.clone(), config.controller);
    let mut source = fix_source(&config, &telemetry);

    info!(
        asset = %config.object.asset,
        root = %config.asset_root.display(),
        fps = config.fps,
        follow = config.follow,
        "tracker started"
    );

    let load = bridge.load_object(config.object.clone());
    tokio::pin!(load);
    let mut loading = true;
    let mut source_open = true;

    let shutdown = shutdown_signal(config.duration_s.map(Duration::from_secs_f64));
    tokio::pin!(shutdown);

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(config.fps)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
            outcome = &mut load, if loading => {
                loading = false;
                match outcome {
                    Ok(LoadOutcome::Ready(object)) => {
                        bridge.add_to_scene(&object);
                        controller.bind(object, config.map.center, Heading::NORTH);
                        info!("vehicle model ready");
                    }
                    Ok(LoadOutcome::Cancelled) => {
                        info!("vehicle load cancelled");
                        break;
                    }
                    Err(e) => error!(error = %e, "vehicle model failed to load; map keeps running without it"),
                }
            }
            now = ticker.tick() => {
                let dt_s = now.duration_since(last_tick).as_secs_f64();
                last_tick = now;
                controller.advance(dt_s);
                let report = map.render_frame(dt_s).context("rendering frame")?;
                if report.layer_errors > 0 || report.layer_panics > 0 {
                    warn!(
                        frame = report.frame_index,
                        errors = report.layer_errors,
                        panics = report.layer_panics,
                        "layers failed this frame"
                    );
                }
            }
            fix = source.next_fix(), if source_open => match fix {
                Some(fix) => {
                    apply_fix(&mut map, &mut controller, fix, config.follow);
                }
                None => {
                    source_open = false;
                    info!("fix source ended");
                }
            },
        }
    }

    map.teardown();
    info!(metrics = %telemetry.snapshot(), "tracker stopped");
    Ok(())
}

/// Hands `fix` to the controller; with `follow`, recenters the map on the
/// committed position when the fix was applied.
fn apply_fix(
    map: &mut MapSurface,
    controller: &mut PoseController,
    fix: GeoCoordinate,
    follow: bool,
) -> UpdateOutcome {
    let outcome = controller.update(fix);
    if let UpdateOutcome::Applied { pose } = outcome {
        if follow {
            map.set_center(pose.position);
        }
    }
    outcome
}

fn fix_source(config: &TrackerConfig, telemetry: &Telemetry) -> Box<dyn FixSource> {
    let interval = Duration::from_millis(config.source.interval_ms);
    match config.source.kind {
        SourceKind::Orbit => {
            let t0_s = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            Box::new(
                OrbitFixSource::new(config.map.center, interval)
                    .with_radius(config.source.radius_deg)
                    .with_start_time(t0_s),
            )
        }
        SourceKind::Stdin => Box::new(
            JsonLinesFixSource::new(BufReader::new(tokio::io::stdin()))
                .with_telemetry(telemetry.clone()),
        ),
    }
}

async fn shutdown_signal(limit: Option<Duration>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };
    match limit {
        Some(limit) => tokio::select! {
            _ = ctrl_c => {}
            _ = tokio::time::sleep(limit) => {}
        },
        None => ctrl_c.await,
    }
}

#[cfg(test)]
mod tests {
    use super::apply_fix;
    use bridge::{BridgeOptions, ObjectSpec, SceneBridge, SceneLayer, StaticAssetLoader};
    use formats::{ModelFormat, encode_glb};
    use foundation::{GeoCoordinate, Heading};
    use gpu::{RecordingCanvas, shared_canvas};
    use map::{HeadlessContainer, MapConfig, MapSurface};
    use tracking::{ControllerOptions, PoseController, UpdateOutcome};

    const MODEL_JSON: &str = r#"{
        "asset": {"version": "2.0"},
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
        "accessors": [{"min": [-1.0, 0.0, -1.0], "max": [1.0, 2.0, 1.0]}]
    }"#;

    fn geo(lon: f64, lat: f64) -> GeoCoordinate {
        GeoCoordinate::new(lon, lat).unwrap()
    }

    fn start() -> GeoCoordinate {
        geo(90.4125, 23.8103)
    }

    fn mount() -> (MapSurface, SceneBridge) {
        let mut container = HeadlessContainer::new(shared_canvas(RecordingCanvas::new(500, 500)));
        let config = MapConfig {
            center: start(),
            zoom: 18.0,
            ..MapConfig::default()
        };
        let mut map = MapSurface::initialize(config, &mut container).unwrap();
        let loader = StaticAssetLoader::new().with("models/bus.glb", encode_glb(MODEL_JSON.as_bytes(), None));
        let (layer, mut rx) = SceneLayer::new("vehicle-3d", BridgeOptions::new(loader));
        map.on_ready(move |map| {
            map.register_layer(layer).unwrap();
        });
        map.notify_style_loaded();
        let bridge = rx.try_recv().unwrap();
        (map, bridge)
    }

    async fn bound_controller(bridge: &SceneBridge) -> PoseController {
        let bus = bridge
            .load_object(ObjectSpec::new("models/bus.glb", ModelFormat::Glb))
            .await
            .unwrap()
            .ready()
            .unwrap();
        bridge.add_to_scene(&bus);
        let mut controller = PoseController::new(bridge.clone(), ControllerOptions::default());
        controller.bind(bus, start(), Heading::NORTH);
        controller
    }

    #[tokio::test]
    async fn follow_recenters_on_applied_fix() {
        let (mut map, bridge) = mount();
        let mut controller = bound_controller(&bridge).await;

        let fix = geo(90.4135, 23.8103);
        let outcome = apply_fix(&mut map, &mut controller, fix, true);
        assert!(matches!(outcome, UpdateOutcome::Applied { .. }));
        assert_eq!(map.view().center, fix);
    }

    #[tokio::test]
    async fn center_stays_put_without_follow() {
        let (mut map, bridge) = mount();
        let mut controller = bound_controller(&bridge).await;

        apply_fix(&mut map, &mut controller, geo(90.4135, 23.8103), false);
        assert_eq!(map.view().center, start());
        assert_eq!(controller.pose().unwrap().position, geo(90.4135, 23.8103));
    }

    #[test]
    fn dropped_fix_leaves_center_alone() {
        let (mut map, bridge) = mount();
        let mut controller = PoseController::new(bridge, ControllerOptions::default());

        let outcome = apply_fix(&mut map, &mut controller, geo(90.4135, 23.8103), true);
        assert_eq!(outcome, UpdateOutcome::Dropped);
        assert_eq!(map.view().center, start());
    }
}

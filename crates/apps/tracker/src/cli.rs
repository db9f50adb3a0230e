use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use formats::ModelFormat;
use tracking::MotionMode;

use crate::config::{SourceKind, TrackerConfig};

/// Fallback for the style provider credential when the config has none.
pub const TOKEN_ENV: &str = "TRACKER_MAPBOX_TOKEN";

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum MotionArg {
    Snap,
    Interpolate,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Track a 3D vehicle model on a headless map surface")]
pub struct Cli {
    /// JSON config file; flags below override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub asset_root: Option<PathBuf>,

    /// Model path relative to the asset root (.glb or .gltf).
    #[arg(long)]
    pub asset: Option<String>,

    #[arg(long)]
    pub fps: Option<u32>,

    /// Stop after this many seconds.
    #[arg(long)]
    pub duration_s: Option<f64>,

    #[arg(long, value_enum)]
    pub motion: Option<MotionArg>,

    /// Glide length for `--motion interpolate`, milliseconds.
    #[arg(long, default_value_t = 800)]
    pub glide_ms: u64,

    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,

    #[arg(long)]
    pub fix_interval_ms: Option<u64>,

    /// Keep the map centered on the vehicle.
    #[arg(long)]
    pub follow: bool,

    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    pub access_token: Option<String>,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied, validated.
    pub fn resolve(&self) -> anyhow::Result<TrackerConfig> {
        let mut config = match &self.config {
            Some(path) => TrackerConfig::load(path)?,
            None => TrackerConfig::default(),
        };

        if let Some(root) = &self.asset_root {
            config.asset_root = root.clone();
        }
        if let Some(asset) = &self.asset {
            let format = ModelFormat::from_path(asset)
                .with_context(|| format!("cannot tell model format of {asset}"))?;
            config.object.asset = asset.clone();
            config.object.format = format;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if self.duration_s.is_some() {
            config.duration_s = self.duration_s;
        }
        match self.motion {
            Some(MotionArg::Snap) => config.controller.motion = MotionMode::Snap,
            Some(MotionArg::Interpolate) => {
                config.controller.motion = MotionMode::Interpolate {
                    duration_s: self.glide_ms as f64 / 1000.0,
                }
            }
            None => {}
        }
        if let Some(kind) = self.source {
            config.source.kind = kind;
        }
        if let Some(ms) = self.fix_interval_ms {
            config.source.interval_ms = ms;
        }
        if self.follow {
            config.follow = true;
        }
        if config.map.access_token.is_none() {
            config.map.access_token = self.access_token.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

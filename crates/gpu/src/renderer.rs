use foundation::Pose;
use foundation::math::{CameraRelativeF32, Vec3};
use scene::World;
use scene::components::{AssetId, Transform};
use scene::entity::EntityId;

use crate::camera::{Camera3D, Mat4};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Light {
    Ambient { intensity: f32 },
    Directional { direction: Vec3, intensity: f32 },
}

/// Ambient fill plus a sun from the south-east, high in the sky.
pub fn default_light_rig() -> Vec<Light> {
    vec![
        Light::Ambient { intensity: 0.8 },
        Light::Directional {
            direction: Vec3::new(-0.5, 1.0, -1.0).normalize(),
            intensity: 0.6,
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    DrawModel {
        entity: EntityId,
        asset: AssetId,
        /// Pose the model is drawn at.
        pose: Pose,
        transform: Transform,
        /// `transform.position` relative to the camera target, narrowed.
        relative_position: CameraRelativeF32,
        label: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub frame_index: u64,
    pub camera: Camera3D,
    pub view_proj: Mat4,
    pub lights: Vec<Light>,
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn new(frame_index: u64, camera: Camera3D) -> Self {
        Self {
            frame_index,
            camera,
            view_proj: camera.view_proj(),
            lights: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Poses of every model in draw order.
    pub fn model_poses(&self) -> Vec<Pose> {
        self.commands
            .iter()
            .map(|c| match c {
                RenderCommand::DrawModel { pose, .. } => *pose,
            })
            .collect()
    }
}

pub struct Renderer;

impl Renderer {
    /// One command per visible, placed 3D drawable, at its displayed pose.
    pub fn collect_3d(world: &World, camera: Camera3D, frame_index: u64) -> RenderFrame {
        let mut frame = RenderFrame::new(frame_index, camera);
        let relative = camera.relative();
        for (entity, placement, drawable) in world.drawables_3d() {
            let pose = placement.displayed;
            let transform = Transform::for_model(pose, &drawable, camera.zoom);
            let label = world
                .properties(entity)
                .and_then(|p| p.tooltip())
                .map(str::to_string);
            frame.commands.push(RenderCommand::DrawModel {
                entity,
                asset: drawable.asset,
                pose,
                transform,
                relative_position: relative.to_f32(transform.position),
                label,
            });
        }
        frame
    }
}

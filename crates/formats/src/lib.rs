pub mod glb;
pub mod gltf;
pub mod model;

pub use glb::*;
pub use model::*;

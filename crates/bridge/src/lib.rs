//! Scene Bridge: a 3D scene kept camera-locked to a map surface.

pub mod bridge;
pub mod error;
pub mod layer;
pub mod loader;
pub mod object;

pub use bridge::*;
pub use error::*;
pub use layer::*;
pub use loader::*;
pub use object::*;

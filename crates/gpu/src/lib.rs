pub mod camera;
pub mod canvas;
pub mod renderer;

pub use camera::*;
pub use canvas::*;
pub use renderer::*;

pub mod bounds;
pub mod drawable3d;
pub mod placement;
pub mod properties;
pub mod transform;
pub mod visibility;

pub use bounds::*;
pub use drawable3d::*;
pub use placement::*;
pub use properties::*;
pub use transform::*;
pub use visibility::*;

//! Vehicle Pose Controller: turns a stream of fixes into committed poses on
//! a scene object.

pub mod controller;
pub mod motion;
pub mod source;

pub use controller::*;
pub use motion::*;
pub use source::*;

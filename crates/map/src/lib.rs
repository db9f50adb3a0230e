//! Map Surface: a georeferenced 2D viewport with a redraw loop that custom
//! layers hook into.

pub mod config;
pub mod container;
pub mod error;
pub mod layer;
pub mod surface;
pub mod view;

pub use config::*;
pub use container::*;
pub use error::*;
pub use layer::*;
pub use surface::*;
pub use view::*;

pub mod handles;
pub mod math;
pub mod pose;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use handles::*;
pub use math::{GeoCoordinate, GeoError, Heading};
pub use pose::*;
pub use time::*;

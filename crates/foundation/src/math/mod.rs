pub mod geodesy;
pub mod heading;
pub mod precision;
pub mod projection;
pub mod vec;

pub use geodesy::*;
pub use heading::*;
pub use precision::*;
pub use projection::*;
pub use vec::*;

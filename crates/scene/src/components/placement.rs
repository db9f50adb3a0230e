use foundation::Pose;

/// Where an object is anchored on the map.
///
/// `committed` is the last pose written by its owner (the reference for the
/// next heading computation). `displayed` is what the renderer draws; it
/// equals `committed` unless the owner is easing between the two.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Placement {
    pub committed: Pose,
    pub displayed: Pose,
}

impl Placement {
    /// Placement with nothing in flight.
    pub fn settled(pose: Pose) -> Self {
        Self {
            committed: pose,
            displayed: pose,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.committed == self.displayed
    }
}

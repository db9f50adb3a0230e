use foundation::Pose;
use serde::{Deserialize, Serialize};

/// How a committed pose reaches the screen.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum MotionMode {
    /// The next frame draws the new pose.
    #[default]
    Snap,
    /// The drawn pose glides to the new one over `duration_s`.
    Interpolate { duration_s: f64 },
}

/// A displayed pose easing from `from` to `to`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tween {
    pub from: Pose,
    pub to: Pose,
    pub duration_s: f64,
    pub elapsed_s: f64,
}

impl Tween {
    pub fn new(from: Pose, to: Pose, duration_s: f64) -> Self {
        Self {
            from,
            to,
            duration_s,
            elapsed_s: 0.0,
        }
    }

    /// Fraction of the way to `to`, in [0, 1].
    pub fn progress(&self) -> f64 {
        if self.duration_s <= 0.0 {
            return 1.0;
        }
        (self.elapsed_s / self.duration_s).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Advances by `dt_s` (bad deltas count as zero) and returns the pose
    /// to draw.
    pub fn advance(&mut self, dt_s: f64) -> Pose {
        if dt_s.is_finite() && dt_s > 0.0 {
            self.elapsed_s += dt_s;
        }
        self.current()
    }

    pub fn current(&self) -> Pose {
        self.from.interpolate(self.to, self.progress())
    }
}

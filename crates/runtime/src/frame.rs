use foundation::time::Time;

/// Frame metadata for the redraw loop.
///
/// The map drives frames at display cadence, so `dt_s` varies from frame to
/// frame; `time` is the running sum of every delta so far.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Seconds since the previous frame.
    pub dt_s: f64,
    /// Loop time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    /// Frame `index` of a fixed-rate loop.
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    /// Placeholder before the first frame has run.
    pub fn before_first() -> Self {
        Self {
            index: 0,
            dt_s: 0.0,
            time: Time::ZERO,
        }
    }

    /// The following frame, `dt_s` seconds later. Negative or non-finite
    /// deltas (clock hiccups) count as zero.
    pub fn advance(self, dt_s: f64) -> Self {
        let dt_s = if dt_s.is_finite() { dt_s.max(0.0) } else { 0.0 };
        Self {
            index: self.index + 1,
            dt_s,
            time: Time(self.time.0 + dt_s),
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::before_first()
    }
}

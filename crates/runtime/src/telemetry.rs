use std::sync::Arc;

use parking_lot::Mutex;

use crate::event_bus::{Event, EventBus};
use crate::frame::Frame;
use crate::metrics::{Metrics, MetricsSnapshot, names};

#[derive(Debug, Default)]
struct TelemetryState {
    frame: Frame,
    events: EventBus,
    metrics: Metrics,
}

/// Shared sink for events and metrics.
///
/// Cloning is cheap; every clone records into the same state. The map
/// surface stamps the current frame so that components without a frame of
/// their own (the pose controller, for instance) still get frame-indexed
/// events.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    inner: Arc<Mutex<TelemetryState>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_frame(&self, frame: Frame) {
        self.inner.lock().frame = frame;
    }

    pub fn frame(&self) -> Frame {
        self.inner.lock().frame
    }

    pub fn emit(&self, kind: &'static str, message: impl Into<String>) {
        let mut state = self.inner.lock();
        let frame = state.frame;
        if state.events.emit(frame, kind, message) {
            state.metrics.inc_counter(names::EVENTS_EVICTED, 1);
        }
    }

    pub fn inc(&self, name: &str, by: u64) {
        self.inner.lock().metrics.inc_counter(name, by);
    }

    pub fn set_gauge(&self, name: &str, value: i64) {
        self.inner.lock().metrics.set_gauge(name, value);
    }

    pub fn record(&self, name: &str, value: i64) {
        self.inner.lock().metrics.record_histogram(name, value);
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.inner.lock().metrics.counter(name)
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.inner.lock().metrics.gauge(name)
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().events.events()
    }

    pub fn count_events(&self, kind: &str) -> usize {
        self.inner.lock().events.count_kind(kind)
    }

    pub fn drain_events(&self) -> Vec<Event> {
        self.inner.lock().events.drain()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::Telemetry;
    use crate::event_bus::{DEFAULT_EVENT_CAPACITY, kinds};
    use crate::frame::Frame;
    use crate::metrics::names;

    #[test]
    fn clones_share_state_and_stamp_current_frame() {
        let a = Telemetry::new();
        let b = a.clone();

        a.set_frame(Frame::new(7, 1.0 / 60.0));
        b.emit(kinds::FIX_DROPPED, "not bound");
        b.inc(names::FIXES_DROPPED, 1);

        let events = a.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].frame_index, 7);
        assert_eq!(a.counter(names::FIXES_DROPPED), 1);
        assert_eq!(a.count_events(kinds::FIX_DROPPED), 1);
    }

    #[test]
    fn long_runs_of_dropped_fixes_stay_bounded() {
        let telemetry = Telemetry::new();
        for _ in 0..86_400 {
            telemetry.emit(kinds::FIX_DROPPED, "not bound");
        }
        assert_eq!(telemetry.events().len(), DEFAULT_EVENT_CAPACITY);
        assert_eq!(
            telemetry.counter(names::EVENTS_EVICTED),
            86_400 - DEFAULT_EVENT_CAPACITY as u64
        );
    }
}

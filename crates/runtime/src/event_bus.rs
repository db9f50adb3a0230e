use std::collections::VecDeque;

use crate::frame::Frame;

/// Events kept before the oldest are evicted.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Well-known event kinds.
pub mod kinds {
    /// A fix arrived before an object was bound and was discarded.
    pub const FIX_DROPPED: &str = "fix.dropped";
    /// A fix was rejected as malformed before reaching the controller.
    pub const FIX_REJECTED: &str = "fix.rejected";
    /// A layer's `render` returned an error; the frame continued.
    pub const RENDER_ERROR: &str = "render.error";
    /// A layer's `render` panicked; the panic was contained.
    pub const RENDER_PANIC: &str = "render.panic";
    /// An asset load finished after teardown and was discarded.
    pub const LOAD_CANCELLED: &str = "load.cancelled";
}

/// Recorded no-ops and contained faults, stamped with the frame they
/// happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub frame_index: u64,
    pub kind: &'static str,
    pub message: String,
}

/// Bounded log of recent events; the oldest are evicted first.
#[derive(Debug)]
pub struct EventBus {
    events: VecDeque<Event>,
    capacity: usize,
    evicted: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
            capacity,
            evicted: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records an event. Returns `true` if an older one was evicted to
    /// make room.
    pub fn emit(&mut self, frame: Frame, kind: &'static str, message: impl Into<String>) -> bool {
        let evicted = self.events.len() >= self.capacity;
        if evicted {
            self.events.pop_front();
            self.evicted += 1;
        }
        self.events.push_back(Event {
            frame_index: frame.index,
            kind,
            message: message.into(),
        });
        evicted
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events dropped to respect the capacity since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

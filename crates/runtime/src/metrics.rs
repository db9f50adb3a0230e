use std::collections::BTreeMap;

/// Well-known metric names.
pub mod names {
    pub const FRAMES_RENDERED: &str = "frames.rendered";
    pub const FRAME_RENDER_ERRORS: &str = "frames.render_errors";
    pub const FRAME_DRAW_COMMANDS: &str = "frame.draw_commands";
    pub const FIXES_APPLIED: &str = "fixes.applied";
    pub const FIXES_DROPPED: &str = "fixes.dropped";
    pub const FIXES_REJECTED: &str = "fixes.rejected";
    /// Ground distance between consecutive applied fixes, whole meters.
    pub const FIX_STEP_M: &str = "fix.step_m";
    pub const LAYERS_REGISTERED: &str = "layers.registered";
    /// Events pushed out of the bounded event log.
    pub const EVENTS_EVICTED: &str = "events.evicted";
}

/// Counters, gauges and histograms with stable (sorted) snapshot order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, i64>,
    histograms: BTreeMap<String, Histogram>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: i64,
    pub min: i64,
    pub max: i64,
}

impl Histogram {
    pub fn record(&mut self, value: i64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(String, u64)>,
    pub gauges: Vec<(String, i64)>,
    pub histograms: Vec<(String, Histogram)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: impl Into<String>, by: u64) {
        *self.counters.entry(name.into()).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: impl Into<String>, value: i64) {
        self.gauges.insert(name.into(), value);
    }

    pub fn record_histogram(&mut self, name: impl Into<String>, value: i64) {
        self.histograms.entry(name.into()).or_default().record(value);
    }

    pub fn histogram(&self, name: &str) -> Option<Histogram> {
        self.histograms.get(name).copied()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            histograms: self
                .histograms
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }
}

impl std::fmt::Display for MetricsSnapshot {
    /// One `name=value` pair per metric, space separated, for log lines.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        parts.extend(self.counters.iter().map(|(k, v)| format!("{k}={v}")));
        parts.extend(self.gauges.iter().map(|(k, v)| format!("{k}={v}")));
        parts.extend(
            self.histograms
                .iter()
                .map(|(k, h)| format!("{k}=[n={} min={} max={}]", h.count, h.min, h.max)),
        );
        f.write_str(&parts.join(" "))
    }
}

use std::time::Duration;

use async_trait::async_trait;
use foundation::GeoCoordinate;
use runtime::{Telemetry, kinds, names};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Stream of location fixes. `None` means the stream has ended.
#[async_trait]
pub trait FixSource: Send {
    async fn next_fix(&mut self) -> Option<GeoCoordinate>;
}

/// Default orbit radius, degrees.
pub const ORBIT_RADIUS_DEG: f64 = 0.001;

/// Point on a small circle around `center` at time `t_s`:
/// `lon = c.lon + sin(t)·r`, `lat = c.lat + cos(t)·r`.
pub fn orbit_point(center: GeoCoordinate, radius_deg: f64, t_s: f64) -> Option<GeoCoordinate> {
    GeoCoordinate::new(
        center.longitude() + t_s.sin() * radius_deg,
        center.latitude() + t_s.cos() * radius_deg,
    )
    .ok()
}

/// Synthetic source: one fix per interval, circling a center point.
pub struct OrbitFixSource {
    center: GeoCoordinate,
    radius_deg: f64,
    ticker: Interval,
    started: Instant,
    /// Orbit time at `started`, seconds.
    t0_s: f64,
    remaining: Option<u64>,
}

impl OrbitFixSource {
    /// First fix arrives one `interval` after construction.
    pub fn new(center: GeoCoordinate, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let started = Instant::now();
        let mut ticker = tokio::time::interval_at(started + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            center,
            radius_deg: ORBIT_RADIUS_DEG,
            ticker,
            started,
            t0_s: 0.0,
            remaining: None,
        }
    }

    pub fn with_radius(mut self, radius_deg: f64) -> Self {
        self.radius_deg = radius_deg;
        self
    }

    /// Orbit phase at construction time, e.g. wall-clock seconds.
    pub fn with_start_time(mut self, t0_s: f64) -> Self {
        self.t0_s = t0_s;
        self
    }

    /// Ends the stream after `count` fixes.
    pub fn with_limit(mut self, count: u64) -> Self {
        self.remaining = Some(count);
        self
    }
}

#[async_trait]
impl FixSource for OrbitFixSource {
    async fn next_fix(&mut self) -> Option<GeoCoordinate> {
        loop {
            if self.remaining == Some(0) {
                return None;
            }
            let now = self.ticker.tick().await;
            let t = self.t0_s + now.duration_since(self.started).as_secs_f64();
            if let Some(fix) = orbit_point(self.center, self.radius_deg, t) {
                if let Some(n) = self.remaining.as_mut() {
                    *n -= 1;
                }
                return Some(fix);
            }
            tracing::debug!(t, "orbit point out of range; skipped");
        }
    }
}

/// Push source: fixes sent through a [`FixSender`] come out in order.
pub struct ChannelFixSource {
    rx: mpsc::Receiver<GeoCoordinate>,
}

pub type FixSender = mpsc::Sender<GeoCoordinate>;

impl ChannelFixSource {
    pub fn channel(capacity: usize) -> (FixSender, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl FixSource for ChannelFixSource {
    async fn next_fix(&mut self) -> Option<GeoCoordinate> {
        self.rx.recv().await
    }
}

/// One JSON coordinate per line: `{"longitude": .., "latitude": ..}` (or
/// `lng`/`lat`, or a `[lon, lat]` pair). Blank lines are ignored; malformed
/// or out-of-range lines are logged and skipped.
pub struct JsonLinesFixSource<R> {
    lines: Lines<R>,
    line_no: u64,
    telemetry: Option<Telemetry>,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesFixSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            telemetry: None,
        }
    }

    /// Records rejected lines as `fix.rejected` events.
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    fn reject(&self, line: &str, error: &serde_json::Error) {
        tracing::warn!(line_no = self.line_no, %error, "skipping malformed fix");
        if let Some(t) = &self.telemetry {
            t.emit(kinds::FIX_REJECTED, format!("line {}: {line}", self.line_no));
            t.inc(names::FIXES_REJECTED, 1);
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FixSource for JsonLinesFixSource<R> {
    async fn next_fix(&mut self) -> Option<GeoCoordinate> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(error) => {
                    tracing::warn!(%error, "fix feed read failed; closing");
                    return None;
                }
            };
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<GeoCoordinate>(trimmed) {
                Ok(fix) => return Some(fix),
                Err(error) => self.reject(trimmed, &error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ChannelFixSource, FixSource, JsonLinesFixSource, OrbitFixSource, orbit_point};
    use foundation::GeoCoordinate;
    use runtime::{Telemetry, kinds, names};

    fn dhaka() -> GeoCoordinate {
        GeoCoordinate::new(90.4125, 23.8103).unwrap()
    }

    #[test]
    fn orbit_formula() {
        let p = orbit_point(dhaka(), 0.001, 0.0).unwrap();
        assert_eq!(p.longitude(), 90.4125);
        assert!((p.latitude() - 23.8113).abs() < 1e-12);

        let q = orbit_point(dhaka(), 0.001, std::f64::consts::FRAC_PI_2).unwrap();
        assert!((q.longitude() - 90.4135).abs() < 1e-12);
        assert!((q.latitude() - 23.8103).abs() < 1e-12);

        let pole = GeoCoordinate::new(0.0, 90.0).unwrap();
        assert!(orbit_point(pole, 0.001, 0.0).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn orbit_emits_one_fix_per_interval() {
        let started = tokio::time::Instant::now();
        let mut source = OrbitFixSource::new(dhaka(), Duration::from_secs(1)).with_limit(3);

        let first = source.next_fix().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert_eq!(Some(first), orbit_point(dhaka(), 0.001, 1.0));

        let second = source.next_fix().await.unwrap();
        assert_eq!(Some(second), orbit_point(dhaka(), 0.001, 2.0));
        assert!(source.next_fix().await.is_some());
        assert!(source.next_fix().await.is_none());
    }

    #[tokio::test]
    async fn channel_source_preserves_order_and_ends_when_senders_drop() {
        let (tx, mut source) = ChannelFixSource::channel(8);
        let a = GeoCoordinate::new(1.0, 1.0).unwrap();
        let b = GeoCoordinate::new(2.0, 2.0).unwrap();
        tx.send(a).await.unwrap();
        tx.send(b).await.unwrap();
        drop(tx);

        assert_eq!(source.next_fix().await, Some(a));
        assert_eq!(source.next_fix().await, Some(b));
        assert_eq!(source.next_fix().await, None);
    }

    #[tokio::test]
    async fn json_lines_skip_bad_input() {
        let feed = concat!(
            "{\"longitude\": 90.4125, \"latitude\": 23.8103}\n",
            "\n",
            "not json\n",
            "{\"lng\": 200.0, \"lat\": 0.0}\n",
            "[90.4135, 23.8103]\n",
        );
        let telemetry = Telemetry::new();
        let mut source = JsonLinesFixSource::new(feed.as_bytes()).with_telemetry(telemetry.clone());

        assert_eq!(source.next_fix().await, Some(dhaka()));
        assert_eq!(
            source.next_fix().await,
            Some(GeoCoordinate::new(90.4135, 23.8103).unwrap())
        );
        assert_eq!(source.next_fix().await, None);

        assert_eq!(telemetry.count_events(kinds::FIX_REJECTED), 2);
        assert_eq!(telemetry.counter(names::FIXES_REJECTED), 2);
    }
}

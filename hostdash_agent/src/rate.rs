//! Previous cumulative counter sample, kept between collector invocations so
//! disk and network collectors can report per-second rates.

use std::sync::Mutex;
use std::time::Instant;

/// A pair of cumulative counters, e.g. (read, written) or (sent, received).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterPair {
    pub a: u64,
    pub b: u64,
}

impl CounterPair {
    pub fn new(a: u64, b: u64) -> Self {
        Self { a, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatePair {
    pub a: f64,
    pub b: f64,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    counters: CounterPair,
    at: Instant,
}

/// Owned, lock-guarded rate state. The read-modify-write in
/// [`RateTracker::observe`] happens under one lock acquisition.
#[derive(Debug, Default)]
pub struct RateTracker {
    last: Mutex<Option<Sample>>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `counters` and return the per-second rate since the previous
    /// sample. The timestamp is taken under the lock, so concurrent callers
    /// are ordered the same way in time and in state.
    pub fn observe(&self, counters: CounterPair) -> RatePair {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        Self::advance(&mut last, counters, Instant::now())
    }

    /// [`observe`](Self::observe) with an explicit timestamp. The first
    /// sample, a non-positive elapsed time and a counter that went backwards
    /// all give 0 for that direction.
    pub fn observe_at(&self, counters: CounterPair, at: Instant) -> RatePair {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        Self::advance(&mut last, counters, at)
    }

    fn advance(last: &mut Option<Sample>, counters: CounterPair, at: Instant) -> RatePair {
        let rates = match *last {
            Some(prev) => match at.checked_duration_since(prev.at) {
                Some(dt) if !dt.is_zero() => {
                    let secs = dt.as_secs_f64();
                    RatePair {
                        a: counters.a.saturating_sub(prev.counters.a) as f64 / secs,
                        b: counters.b.saturating_sub(prev.counters.b) as f64 / secs,
                    }
                }
                _ => RatePair::default(),
            },
            None => RatePair::default(),
        };
        *last = Some(Sample { counters, at });
        rates
    }

    pub fn reset(&self) {
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_seeded(&self) -> bool {
        self.last.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

/// Human-readable speed, 1024-step units with two decimals.
pub fn format_speed(bytes_per_sec: f64) -> String {
    let mut v = if bytes_per_sec.is_finite() { bytes_per_sec } else { 0.0 };
    for unit in ["B/s", "KB/s", "MB/s", "GB/s"] {
        if v < 1024.0 {
            return format!("{v:.2} {unit}");
        }
        v /= 1024.0;
    }
    format!("{v:.2} TB/s")
}

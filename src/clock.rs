//! Monotonic clocks for the reveal engine.
//!
//! The engine never reads wall-clock time directly. Every timestamp it stores is
//! a [`Duration`] since the origin of its [`Clock`], which keeps deadline math in
//! plain integers and lets tests and simulated replays control time exactly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Source of the current time, as an offset from the clock's origin.
pub trait Clock: Send + 'static {
    /// Time elapsed since the clock origin.
    fn now(&self) -> Duration;
}

/// Real monotonic time.
///
/// Built on `tokio::time::Instant`, so a paused tokio runtime drives it in tests.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// The instant corresponding to `offset` on this clock.
    pub fn instant_at(&self, offset: Duration) -> Instant {
        self.origin + offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually driven clock with microsecond resolution.
///
/// Clones share the same time, so a test can keep one handle while the engine
/// owns another. Time never moves backwards.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_us: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now_us
            .fetch_add(duration_to_micros(by), Ordering::SeqCst);
    }

    /// Moves time to `at`; earlier values are ignored.
    pub fn set(&self, at: Duration) {
        self.now_us
            .fetch_max(duration_to_micros(at), Ordering::SeqCst);
    }

    /// Shorthand for `set(Duration::from_millis(ms))`.
    pub fn set_ms(&self, ms: u64) {
        self.set(Duration::from_millis(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.now_us.load(Ordering::SeqCst))
    }
}

fn duration_to_micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

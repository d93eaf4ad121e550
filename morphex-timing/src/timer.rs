use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for monotonic timers
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync + std::fmt::Debug;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;

    /// Elapsed time rounded to the nearest whole millisecond.
    fn elapsed_ms(&self, ts: Self::Timestamp) -> u64 {
        (self.elapsed(ts).as_secs_f64() * 1_000.0).round() as u64
    }
}

/// Nanoseconds since construction, backed by `Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicTimer {
    pub start: Instant,
}

impl Timer for MonotonicTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
}

impl MonotonicTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns
            .fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_timer_clones_share_time() {
        let timer = ManualTimer::new();
        let start = timer.now();
        let other = timer.clone();
        other.advance(Duration::from_micros(1_499_600));
        assert_eq!(timer.elapsed(start), Duration::from_micros(1_499_600));
        assert_eq!(timer.elapsed_ms(start), 1_500);
    }

    #[test]
    fn elapsed_never_goes_negative() {
        let timer = ManualTimer::new();
        timer.advance(Duration::from_millis(5));
        let later = timer.now() + 1_000_000;
        assert_eq!(timer.elapsed(later), Duration::ZERO);
        assert_eq!(timer.elapsed_ms(later), 0);
    }

    #[test]
    fn monotonic_timer_moves_forward() {
        let timer = MonotonicTimer::new();
        let a = timer.now();
        std::thread::sleep(Duration::from_millis(2));
        assert!(timer.elapsed(a) >= Duration::from_millis(2));
    }
}

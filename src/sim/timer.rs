//! Simulation clock and interval stopwatch
//!
//! Everything here reads simulation seconds, never wall-clock time, so a
//! fixed-step replay produces identical timings.

use serde::{Deserialize, Serialize};

/// Nanoseconds per simulation second
const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Monotonic simulation clock advanced once per physics tick.
///
/// Elapsed time is an integer nanosecond count, so a fixed step adds the
/// same amount on tick 10 and on tick 10 billion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    nanos: u64,
    ticks: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock positioned at a raw nanosecond count
    pub fn from_nanos(nanos: u64, ticks: u64) -> Self {
        Self { nanos, ticks }
    }

    /// Current simulation time in seconds
    #[inline]
    pub fn now(&self) -> f64 {
        self.nanos as f64 / NANOS_PER_SEC
    }

    #[inline]
    pub fn nanos(&self) -> u64 {
        self.nanos
    }

    /// Ticks advanced so far
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance by one tick of `dt` seconds (negative steps are ignored)
    pub fn advance(&mut self, dt: f32) -> f64 {
        let step = (f64::from(dt.max(0.0)) * NANOS_PER_SEC).round() as u64;
        self.nanos = self.nanos.saturating_add(step);
        self.ticks += 1;
        self.now()
    }
}

/// Interval-accumulating stopwatch
///
/// `elapsed_total` is the sum of every closed start→stop interval plus the
/// live interval while running.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timer {
    running: bool,
    start_time: f64,
    accumulated: f64,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Clear accumulated time and stop
    pub fn reset(&mut self) {
        self.accumulated = 0.0;
        self.running = false;
    }

    /// Begin a live interval. Calling while running re-bases the live
    /// interval; accumulated time is kept.
    pub fn start_interval(&mut self, now: f64) {
        self.start_time = now;
        self.running = true;
    }

    /// Fold the live interval into the accumulated total. No-op when stopped.
    pub fn stop_interval(&mut self, now: f64) {
        if !self.running {
            return;
        }
        self.accumulated += (now - self.start_time).max(0.0);
        self.running = false;
    }

    pub fn elapsed_total(&self, now: f64) -> f64 {
        let live = if self.running {
            (now - self.start_time).max(0.0)
        } else {
            0.0
        };
        self.accumulated + live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clock_advance() {
        let mut clock = SimClock::new();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.now(), 0.75);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn test_fixed_step_is_exact() {
        let mut clock = SimClock::new();
        for _ in 0..50 {
            clock.advance(1.0 / 50.0);
        }
        assert_eq!(clock.nanos(), 1_000_000_000);
        assert_eq!(clock.now(), 1.0);
    }

    #[test]
    fn test_clock_keeps_advancing_after_long_runs() {
        // Past the point where an f32 running total stops moving at 50 Hz
        let ticks = 30_000_000u64;
        let mut clock = SimClock::from_nanos(ticks * 20_000_000, ticks);
        assert_eq!(clock.now(), 600_000.0);

        let before = clock.now();
        let after = clock.advance(1.0 / 50.0);
        assert!((after - before - 0.02).abs() < 1e-6, "step {}", after - before);
        assert_eq!(clock.ticks(), ticks + 1);
    }

    #[test]
    fn test_long_idle_sampling_stays_on_the_second() {
        let mut timer = Timer::new();
        let start = 524_288.0;
        timer.start_interval(start);
        timer.stop_interval(start + 1.0);
        assert_eq!(timer.elapsed_total(start + 5.0), 1.0);
    }

    #[test]
    fn test_timer_accumulates_intervals() {
        let mut timer = Timer::new();
        timer.start_interval(1.0);
        assert!(timer.is_running());
        assert_eq!(timer.elapsed_total(1.5), 0.5);
        timer.stop_interval(2.0);
        timer.start_interval(5.0);
        timer.stop_interval(7.0);
        assert_eq!(timer.elapsed_total(100.0), 3.0);
    }

    #[test]
    fn test_timer_stop_while_stopped_is_noop() {
        let mut timer = Timer::new();
        timer.start_interval(0.0);
        timer.stop_interval(1.0);
        timer.stop_interval(4.0);
        assert_eq!(timer.elapsed_total(10.0), 1.0);
    }

    #[test]
    fn test_timer_restart_rebases_live_interval() {
        let mut timer = Timer::new();
        timer.start_interval(0.0);
        timer.start_interval(2.0);
        timer.stop_interval(3.0);
        assert_eq!(timer.elapsed_total(3.0), 1.0);
    }

    #[test]
    fn test_timer_reset() {
        let mut timer = Timer::new();
        timer.start_interval(0.0);
        timer.stop_interval(2.0);
        timer.start_interval(3.0);
        timer.reset();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed_total(10.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_elapsed_equals_sum_of_intervals(
            intervals in prop::collection::vec((0.0f64..5.0, 0.0f64..5.0), 0..16)
        ) {
            let mut timer = Timer::new();
            let mut now = 0.0f64;
            let mut expected = 0.0f64;
            for (gap, len) in intervals {
                now += gap;
                timer.start_interval(now);
                now += len;
                timer.stop_interval(now);
                expected += len;
            }
            prop_assert!((timer.elapsed_total(now + 1.0) - expected).abs() < 1e-9);
        }
    }
}

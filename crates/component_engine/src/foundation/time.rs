//! Time sources for the real-time loop

use std::time::{Duration, Instant};

/// Monotonic time source sampled once per real frame
pub trait Clock {
    /// Current time in seconds since an arbitrary fixed origin
    fn now(&mut self) -> f64;
}

/// Wall clock backed by [`Instant`]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Create a clock whose origin is the moment of creation
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Deterministic clock for tests and offline runs
///
/// Every sample returns the current time and then moves it forward by
/// `step`, so a loop driven by this clock sees a constant frame time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: f64,
    step: f64,
}

impl ManualClock {
    /// Clock frozen at `start` until advanced by hand
    pub fn new(start: f64) -> Self {
        Self { current: start, step: 0.0 }
    }

    /// Clock that advances by `step` seconds after each sample
    pub fn stepping(start: f64, step: f64) -> Self {
        Self { current: start, step }
    }

    /// Move the clock forward
    pub fn advance(&mut self, seconds: f64) {
        self.current += seconds;
    }
}

impl Clock for ManualClock {
    fn now(&mut self) -> f64 {
        let now = self.current;
        self.current += self.step;
        now
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in seconds
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_steps_after_each_sample() {
        let mut clock = ManualClock::stepping(1.0, 0.5);
        assert_eq!(clock.now(), 1.0);
        assert_eq!(clock.now(), 1.5);
        clock.advance(1.0);
        assert_eq!(clock.now(), 3.0);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let mut clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn test_stopwatch_accumulates() {
        let mut stopwatch = Stopwatch::start_new();
        assert!(stopwatch.is_running());
        stopwatch.stop();
        assert!(!stopwatch.is_running());
        let frozen = stopwatch.elapsed();
        assert_eq!(stopwatch.elapsed(), frozen);
    }
}

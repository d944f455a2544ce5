//! Stopwatch that turns a monotonic [`Clock`] into per-frame deltas.

use crate::platform::{Clock, TimeSource};

/// Generic [`TimeSource`] built on any monotonic [`Clock`].
///
/// With auto-start enabled, the first [`delta`](TimeSource::delta) poll on an
/// idle stopwatch starts it and reports `0.0`. Calling
/// [`stop`](TimeSource::stop) disables auto-start, so a stopped stopwatch
/// stays stopped until it is explicitly started again.
#[derive(Debug, Clone)]
pub struct DeltaClock<C: Clock> {
    clock: C,
    auto_start: bool,
    last: Option<C::Instant>,
    elapsed: f64,
    running: bool,
}

impl<C: Clock> DeltaClock<C> {
    /// Creates a stopwatch that starts on its first poll.
    pub fn new(clock: C) -> Self {
        Self::with_auto_start(clock, true)
    }

    /// Creates a stopwatch that only runs after an explicit `start()`.
    pub fn manual(clock: C) -> Self {
        Self::with_auto_start(clock, false)
    }

    pub fn with_auto_start(clock: C, auto_start: bool) -> Self {
        Self {
            clock,
            auto_start,
            last: None,
            elapsed: 0.0,
            running: false,
        }
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    /// Clears the accumulated elapsed total without touching the run state.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        if self.running {
            self.last = Some(self.clock.now());
        }
    }
}

impl<C: Clock> TimeSource for DeltaClock<C> {
    fn start(&mut self) {
        if self.running {
            return;
        }
        self.last = Some(self.clock.now());
        self.running = true;
    }

    fn stop(&mut self) {
        self.delta();
        self.running = false;
        self.auto_start = false;
    }

    fn delta(&mut self) -> f64 {
        if self.auto_start && !self.running {
            self.start();
            return 0.0;
        }
        if !self.running {
            return 0.0;
        }

        let now = self.clock.now();
        let diff = match self.last {
            Some(last) => self.clock.seconds_between(last, now).max(0.0),
            None => 0.0,
        };
        self.last = Some(now);
        self.elapsed += diff;
        diff
    }

    fn elapsed_time(&mut self) -> f64 {
        self.delta();
        self.elapsed
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
#[path = "tests/delta_clock_tests.rs"]
mod tests;

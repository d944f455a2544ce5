//! Interval throttling for loop ticks.
//!
//! A throttled loop still accumulates elapsed time every frame, but only fires
//! its callbacks when elapsed time crosses the next interval boundary. The
//! delta delivered on a firing tick spans every frame skipped since the
//! previous firing, so the delivered deltas always sum to the elapsed time at
//! the last firing.

/// Boundary bookkeeping for an optional throttle interval, in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Throttle {
    interval: Option<f64>,
    last_tick_elapsed: f64,
    interval_count: i64,
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            interval: None,
            last_tick_elapsed: 0.0,
            interval_count: -1,
        }
    }
}

/// Non-positive and non-finite intervals mean "unthrottled".
pub(crate) fn normalize_interval(interval: Option<f64>) -> Option<f64> {
    interval.filter(|seconds| seconds.is_finite() && *seconds > 0.0)
}

impl Throttle {
    pub fn new(interval: Option<f64>) -> Self {
        Self {
            interval: normalize_interval(interval),
            ..Self::default()
        }
    }

    pub fn interval(&self) -> Option<f64> {
        self.interval
    }

    /// Boundaries already fired; `-1` until the first firing.
    pub fn interval_count(&self) -> i64 {
        self.interval_count
    }

    pub fn last_tick_elapsed(&self) -> f64 {
        self.last_tick_elapsed
    }

    /// Replaces the interval, returning `false` when `interval` was rejected
    /// and the throttle fell back to unthrottled.
    ///
    /// The boundary containing `elapsed` is treated as not yet fired, so the
    /// next tick fires immediately under the new interval.
    pub fn set_interval(&mut self, interval: Option<f64>, elapsed: f64) -> bool {
        let normalized = normalize_interval(interval);
        if normalized != self.interval {
            self.interval = normalized;
            self.interval_count = match normalized {
                Some(seconds) => boundary(elapsed, seconds) - 1,
                None => -1,
            };
        }
        normalized.is_some() || interval.is_none()
    }

    /// Decides whether the tick that brought the total to `elapsed` fires.
    ///
    /// Returns the delta to deliver to callbacks, or `None` to skip.
    pub fn admit(&mut self, elapsed: f64, dt: f64) -> Option<f64> {
        let Some(interval) = self.interval else {
            self.last_tick_elapsed = elapsed;
            return Some(dt);
        };

        let count = boundary(elapsed, interval);
        if count <= self.interval_count {
            return None;
        }

        let effective = elapsed - self.last_tick_elapsed;
        self.interval_count = count;
        self.last_tick_elapsed = elapsed;
        Some(effective)
    }

    /// Forgets fired boundaries, keeping the interval.
    pub fn reset(&mut self) {
        self.last_tick_elapsed = 0.0;
        self.interval_count = -1;
    }
}

fn boundary(elapsed: f64, interval: f64) -> i64 {
    (elapsed / interval).floor() as i64
}

#[cfg(test)]
#[path = "tests/throttle_tests.rs"]
mod tests;

//! Deterministic time for tests.

use animloop_core::{Clock, DeltaClock, TimeSource};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Clock whose current instant only moves when told to.
///
/// Clones share the same instant, so a test keeps one clone and hands the
/// other to a [`DeltaClock`].
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }

    pub fn seconds(&self) -> f64 {
        self.now.get()
    }

    /// A stopwatch over this clock that only runs after `start()`.
    pub fn stopwatch(&self) -> DeltaClock<ManualClock> {
        DeltaClock::manual(self.clone())
    }
}

impl Clock for ManualClock {
    type Instant = f64;

    fn now(&self) -> f64 {
        self.now.get()
    }

    fn seconds_between(&self, earlier: f64, later: f64) -> f64 {
        (later - earlier).max(0.0)
    }
}

#[derive(Debug, Default)]
struct ManualTimeState {
    running: bool,
    next_delta: f64,
    queued: VecDeque<f64>,
    elapsed: f64,
    start_calls: usize,
    stop_calls: usize,
    polls: usize,
}

/// [`TimeSource`] that returns scripted deltas and counts how it is used.
///
/// While running, each poll yields the next queued delta, or the value set
/// with [`set_delta`](Self::set_delta) once the queue is empty. A stopped
/// source yields `0.0`.
#[derive(Clone, Debug, Default)]
pub struct ManualTimeSource {
    state: Rc<RefCell<ManualTimeState>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta reported by every poll once the queue is exhausted.
    pub fn set_delta(&self, seconds: f64) {
        self.state.borrow_mut().next_delta = seconds;
    }

    pub fn queue_deltas(&self, deltas: impl IntoIterator<Item = f64>) {
        self.state.borrow_mut().queued.extend(deltas);
    }

    pub fn start_calls(&self) -> usize {
        self.state.borrow().start_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.state.borrow().stop_calls
    }

    /// Number of `delta()` polls so far.
    pub fn polls(&self) -> usize {
        self.state.borrow().polls
    }
}

impl TimeSource for ManualTimeSource {
    fn start(&mut self) {
        let mut state = self.state.borrow_mut();
        state.start_calls += 1;
        state.running = true;
    }

    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.stop_calls += 1;
        state.running = false;
    }

    fn delta(&mut self) -> f64 {
        let mut state = self.state.borrow_mut();
        state.polls += 1;
        if !state.running {
            return 0.0;
        }
        let delta = match state.queued.pop_front() {
            Some(delta) => delta,
            None => state.next_delta,
        };
        state.elapsed += delta;
        delta
    }

    fn elapsed_time(&mut self) -> f64 {
        self.state.borrow().elapsed
    }

    fn is_running(&self) -> bool {
        self.state.borrow().running
    }
}

#[cfg(test)]
#[path = "tests/time_tests.rs"]
mod tests;

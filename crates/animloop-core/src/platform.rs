//! Platform abstraction traits for animation loop services.
//!
//! These traits let an [`AnimationLoop`](crate::AnimationLoop) delegate frame
//! scheduling and time keeping to the host, so the scheduler itself never
//! touches a window system or a wall clock.

use std::fmt;

/// Identifier handed out by a [`FrameSource`] for one pending frame request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRequestId(pub u64);

impl fmt::Display for FrameRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// Delivers one-shot callbacks at the next frame boundary.
///
/// Implementations must invoke a requested callback at most once and never
/// synchronously from inside `request_frame`. All methods take `&self`;
/// implementations keep their queue behind interior mutability.
pub trait FrameSource {
    /// Request that `callback` run at the next frame boundary.
    fn request_frame(&self, callback: Box<dyn FnOnce() + 'static>) -> FrameRequestId;

    /// Cancel a pending request. Unknown, stale or already fired ids are ignored.
    fn cancel_frame(&self, id: FrameRequestId);
}

/// Provides monotonic instants.
pub trait Clock {
    /// Instant type produced by this clock implementation.
    type Instant: Copy;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the number of seconds between two instants. Never negative.
    fn seconds_between(&self, earlier: Self::Instant, later: Self::Instant) -> f64;
}

/// Start/stop stopwatch that yields per-poll deltas.
///
/// The root of a loop tree polls [`delta`](TimeSource::delta) once per frame.
pub trait TimeSource {
    /// Arm the stopwatch. Does nothing while already running.
    fn start(&mut self);

    /// Flush the pending delta into the elapsed total and halt.
    fn stop(&mut self);

    /// Seconds since the previous poll, never negative.
    fn delta(&mut self) -> f64;

    /// Total running seconds, excluding stopped intervals.
    fn elapsed_time(&mut self) -> f64;

    fn is_running(&self) -> bool;
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn start(&mut self) {
        (**self).start()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn delta(&mut self) -> f64 {
        (**self).delta()
    }

    fn elapsed_time(&mut self) -> f64 {
        (**self).elapsed_time()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }
}

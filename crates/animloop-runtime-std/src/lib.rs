//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the collaborator traits
//! defined in `animloop-core`: a monotonic [`StdClock`], the
//! [`StdTimeSource`] stopwatch built on it, and [`StdFrameSource`], a frame
//! queue the host drains once per rendered frame. [`StdRuntime`] bundles them
//! and can pace frames itself when no window system is involved.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use animloop_core::{
    AnimationLoop, Clock, DeltaClock, FrameRequestId, FrameSource, LoopSettings,
};
use web_time::Instant;

/// Default frame pacing used by [`StdRuntime`] (~60 FPS).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_nanos(16_666_667);

/// Clock implementation backed by a monotonic [`Instant`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn seconds_between(&self, earlier: Self::Instant, later: Self::Instant) -> f64 {
        later.saturating_duration_since(earlier).as_secs_f64()
    }
}

/// Auto-starting stopwatch over [`StdClock`].
pub type StdTimeSource = DeltaClock<StdClock>;

/// Returns a fresh [`StdTimeSource`].
pub fn std_time_source() -> StdTimeSource {
    DeltaClock::new(StdClock)
}

struct FrameEntry {
    id: FrameRequestId,
    callback: Box<dyn FnOnce() + 'static>,
}

/// Frame queue drained by the host once per frame.
///
/// Requests made while a frame is being drained are delivered on the next
/// frame, never in the one currently running.
pub struct StdFrameSource {
    queue: RefCell<VecDeque<FrameEntry>>,
    next_id: Cell<u64>,
    frame_waker: RefCell<Option<Rc<dyn Fn()>>>,
}

impl StdFrameSource {
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            next_id: Cell::new(1),
            frame_waker: RefCell::new(None),
        }
    }

    /// Registers a waker that will be invoked whenever a new frame is requested.
    pub fn set_frame_waker(&self, waker: impl Fn() + 'static) {
        *self.frame_waker.borrow_mut() = Some(Rc::new(waker));
    }

    /// Clears any registered frame waker.
    pub fn clear_frame_waker(&self) {
        *self.frame_waker.borrow_mut() = None;
    }

    /// Whether any callback is waiting for the next frame.
    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs every callback requested before this call. Returns how many ran.
    pub fn drain_frame_callbacks(&self) -> usize {
        let pending: Vec<FrameEntry> = self.queue.borrow_mut().drain(..).collect();
        let count = pending.len();
        for entry in pending {
            log::trace!("delivering {}", entry.id);
            (entry.callback)();
        }
        count
    }

    fn wake(&self) {
        let waker = self.frame_waker.borrow().clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdFrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdFrameSource")
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl FrameSource for StdFrameSource {
    fn request_frame(&self, callback: Box<dyn FnOnce() + 'static>) -> FrameRequestId {
        let id = FrameRequestId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.queue.borrow_mut().push_back(FrameEntry { id, callback });
        self.wake();
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        let mut queue = self.queue.borrow_mut();
        if let Some(index) = queue.iter().position(|entry| entry.id == id) {
            queue.remove(index);
        }
    }
}

/// Convenience container bundling the frame queue with frame pacing.
#[derive(Clone)]
pub struct StdRuntime {
    frames: Rc<StdFrameSource>,
    frame_interval: Duration,
}

impl StdRuntime {
    /// Creates a runtime paced at [`DEFAULT_FRAME_INTERVAL`].
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(frame_interval: Duration) -> Self {
        Self {
            frames: Rc::new(StdFrameSource::new()),
            frame_interval,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Returns the frame queue.
    pub fn frames(&self) -> Rc<StdFrameSource> {
        Rc::clone(&self.frames)
    }

    /// Returns the frame queue as the trait object loops are built from.
    pub fn frame_source(&self) -> Rc<dyn FrameSource> {
        self.frames.clone()
    }

    /// Creates a root loop driven by this runtime with a [`StdTimeSource`].
    pub fn new_loop(&self, settings: LoopSettings) -> AnimationLoop {
        AnimationLoop::with_settings(self.frame_source(), std_time_source(), settings)
    }

    /// Delivers one frame immediately. Returns how many callbacks ran.
    pub fn pump_frame(&self) -> usize {
        self.frames.drain_frame_callbacks()
    }

    /// Whether another frame has been requested.
    pub fn needs_frame(&self) -> bool {
        self.frames.has_pending()
    }

    /// Pumps frames at the configured pace until no frame is requested or
    /// `max_frames` have been delivered. Returns the number of frames pumped.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run_frames(&self, max_frames: usize) -> usize {
        let mut pumped = 0;
        let mut deadline = Instant::now();
        while pumped < max_frames && self.needs_frame() {
            deadline += self.frame_interval;
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            } else {
                // Fell behind; pace from now instead of bursting to catch up.
                deadline = now;
            }
            self.pump_frame();
            pumped += 1;
        }
        log::debug!("pumped {} frames", pumped);
        pumped
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("frames", &self.frames)
            .field("frame_interval", &self.frame_interval)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/std_runtime_tests.rs"]
mod tests;

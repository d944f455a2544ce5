//! Frame source that only fires when the test says so.

use animloop_core::{FrameRequestId, FrameSource};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

struct PendingFrame {
    id: FrameRequestId,
    callback: Box<dyn FnOnce() + 'static>,
}

/// [`FrameSource`] with a manually advanced frame boundary.
///
/// Every request and cancellation is counted so tests can assert on the
/// single-request invariant of a loop tree.
pub struct TestFrameSource {
    queue: RefCell<VecDeque<PendingFrame>>,
    next_id: Cell<u64>,
    requests: Cell<usize>,
    cancellations: Cell<usize>,
    max_outstanding: Cell<usize>,
    frames_fired: Cell<usize>,
}

impl TestFrameSource {
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            next_id: Cell::new(1),
            requests: Cell::new(0),
            cancellations: Cell::new(0),
            max_outstanding: Cell::new(0),
            frames_fired: Cell::new(0),
        }
    }

    /// Delivers one frame boundary: runs every callback requested before
    /// this call and returns how many ran.
    pub fn fire(&self) -> usize {
        let pending: Vec<PendingFrame> = self.queue.borrow_mut().drain(..).collect();
        self.frames_fired.set(self.frames_fired.get() + 1);
        let count = pending.len();
        for frame in pending {
            log::trace!("test frame source firing {}", frame.id);
            (frame.callback)();
        }
        count
    }

    /// Total `request_frame` calls.
    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    /// Cancellations that removed a pending request.
    pub fn cancel_count(&self) -> usize {
        self.cancellations.get()
    }

    /// Requests currently waiting for the next boundary.
    pub fn outstanding(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Highest number of simultaneously outstanding requests seen so far.
    pub fn max_outstanding(&self) -> usize {
        self.max_outstanding.get()
    }

    /// Number of boundaries delivered with [`fire`](Self::fire).
    pub fn frames_fired(&self) -> usize {
        self.frames_fired.get()
    }
}

impl Default for TestFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TestFrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestFrameSource")
            .field("outstanding", &self.outstanding())
            .field("requests", &self.request_count())
            .field("cancellations", &self.cancel_count())
            .finish()
    }
}

impl FrameSource for TestFrameSource {
    fn request_frame(&self, callback: Box<dyn FnOnce() + 'static>) -> FrameRequestId {
        let id = FrameRequestId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.requests.set(self.requests.get() + 1);

        let mut queue = self.queue.borrow_mut();
        queue.push_back(PendingFrame { id, callback });
        if queue.len() > self.max_outstanding.get() {
            self.max_outstanding.set(queue.len());
        }
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        let mut queue = self.queue.borrow_mut();
        if let Some(index) = queue.iter().position(|frame| frame.id == id) {
            queue.remove(index);
            self.cancellations.set(self.cancellations.get() + 1);
        }
    }
}

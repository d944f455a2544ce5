use crate::platform::{FrameRequestId, FrameSource};
use std::fmt;
use std::rc::Rc;

/// Owned handle to one pending frame request.
///
/// Dropping the registration cancels the request, so a request can never
/// outlive the loop that made it.
pub struct FrameRegistration {
    frames: Rc<dyn FrameSource>,
    id: Option<FrameRequestId>,
}

impl FrameRegistration {
    /// Requests `callback` from `frames` and wraps the resulting id.
    pub fn request(frames: &Rc<dyn FrameSource>, callback: impl FnOnce() + 'static) -> Self {
        let id = frames.request_frame(Box::new(callback));
        Self {
            frames: Rc::clone(frames),
            id: Some(id),
        }
    }

    pub fn id(&self) -> Option<FrameRequestId> {
        self.id
    }

    /// Marks the request as delivered so dropping it does not cancel anything.
    pub fn complete(mut self) {
        self.id = None;
    }

    pub fn cancel(mut self) {
        if let Some(id) = self.id.take() {
            self.frames.cancel_frame(id);
        }
    }
}

impl Drop for FrameRegistration {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.frames.cancel_frame(id);
        }
    }
}

impl fmt::Debug for FrameRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameRegistration")
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/frame_clock_tests.rs"]
mod tests;

use crate::frames::TestFrameSource;
use crate::time::ManualTimeSource;
use animloop_core::{AnimationLoop, FrameFn, FrameSource, LoopSettings};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Headless harness for driving a loop tree one frame at a time.
///
/// `LoopHarness` owns a [`TestFrameSource`] and a [`ManualTimeSource`] wired
/// into a root loop, so a test decides exactly when frames arrive and how
/// much time each one covers.
pub struct LoopHarness {
    frames: Rc<TestFrameSource>,
    time: ManualTimeSource,
    root: AnimationLoop,
}

impl LoopHarness {
    /// Create a harness whose root loop uses default settings.
    pub fn new() -> Self {
        Self::with_settings(LoopSettings::new().with_label("root"))
    }

    pub fn with_settings(settings: LoopSettings) -> Self {
        let frames = Rc::new(TestFrameSource::new());
        let time = ManualTimeSource::new();
        let source: Rc<dyn FrameSource> = frames.clone();
        let root = AnimationLoop::with_settings(source, time.clone(), settings);
        Self { frames, time, root }
    }

    pub fn root(&self) -> &AnimationLoop {
        &self.root
    }

    pub fn frames(&self) -> &TestFrameSource {
        &self.frames
    }

    pub fn time(&self) -> &ManualTimeSource {
        &self.time
    }

    /// Deliver one frame covering `dt` seconds. Returns whether any frame
    /// callback was waiting.
    pub fn step(&self, dt: f64) -> bool {
        self.time.set_delta(dt);
        self.frames.fire() > 0
    }

    /// Deliver one frame per delta, stopping early once nothing is waiting.
    /// Returns the number of frames that reached a loop.
    pub fn run(&self, deltas: impl IntoIterator<Item = f64>) -> usize {
        let mut delivered = 0;
        for dt in deltas {
            if !self.step(dt) {
                break;
            }
            delivered += 1;
        }
        delivered
    }

    /// Deliver `frames` frames of `dt` seconds each.
    pub fn run_uniform(&self, frames: usize, dt: f64) -> usize {
        self.run(std::iter::repeat(dt).take(frames))
    }
}

impl Default for LoopHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// One recorded callback invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub label: &'static str,
    pub dt: f64,
    pub elapsed: f64,
}

/// Shared log of callback invocations, in call order.
#[derive(Clone, Debug, Default)]
pub struct CallRecorder {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that records itself under `label` and keeps firing.
    pub fn callback(&self, label: &'static str) -> FrameFn {
        let calls = Rc::clone(&self.calls);
        FrameFn::new(move |dt, elapsed| {
            calls.borrow_mut().push(Call { label, dt, elapsed });
        })
    }

    /// A callback that records itself and then removes itself after `times`
    /// invocations.
    pub fn limited(&self, label: &'static str, times: usize) -> FrameFn {
        let calls = Rc::clone(&self.calls);
        let remaining = Cell::new(times.max(1));
        FrameFn::new(move |dt, elapsed| {
            calls.borrow_mut().push(Call { label, dt, elapsed });
            remaining.set(remaining.get() - 1);
            remaining.get() > 0
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|call| call.label).collect()
    }

    /// Number of recorded calls made under `label`.
    pub fn count(&self, label: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.label == label)
            .count()
    }

    /// `dt` values received under `label`, in order.
    pub fn deltas(&self, label: &str) -> Vec<f64> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.label == label)
            .map(|call| call.dt)
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

/// Route `log` output through the test harness. Safe to call from every test.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
#[path = "tests/harness_tests.rs"]
mod tests;

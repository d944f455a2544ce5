//! Testing utilities and harness for animloop

pub mod assertions;
pub mod frames;
pub mod harness;
pub mod time;

pub use frames::TestFrameSource;
pub use harness::{init_test_logging, Call, CallRecorder, LoopHarness};
pub use time::{ManualClock, ManualTimeSource};

pub mod prelude {
    pub use crate::assertions;
    pub use crate::assertions::assert_approx_eq;
    pub use crate::frames::TestFrameSource;
    pub use crate::harness::*;
    pub use crate::time::*;
    pub use animloop_core::{AnimationLoop, Flow, FrameFn, LoopError, LoopSettings, LoopState, Phase};
}

//! Frame-driven callback scheduling.
//!
//! An [`AnimationLoop`] invokes registered callbacks once per frame, or once
//! per throttle interval, in four ordered categories
//! (`before → main → after → base`). Loops compose into trees where children
//! ride on their parent's ticks, so a whole tree needs a single frame request
//! from the host.
//!
//! The host supplies two collaborators: a [`FrameSource`] that delivers
//! one-shot callbacks at frame boundaries and a [`TimeSource`] that measures
//! deltas. [`DeltaClock`] builds the latter from any monotonic [`Clock`].

mod animation_loop;
mod callbacks;
mod delta_clock;
mod error;
mod frame_clock;
pub mod platform;
mod settings;
mod throttle;

pub use animation_loop::{AnimationLoop, LoopState};
pub use callbacks::{CallbackSet, Flow, FrameFn, Phase, Snapshot};
pub use delta_clock::DeltaClock;
pub use error::LoopError;
pub use frame_clock::FrameRegistration;
pub use platform::{Clock, FrameRequestId, FrameSource, TimeSource};
pub use settings::LoopSettings;
pub use throttle::Throttle;

/// Version of the scheduler crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

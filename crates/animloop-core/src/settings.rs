//! Construction-time configuration for animation loops.

use crate::throttle::normalize_interval;

/// Configuration for a new [`AnimationLoop`](crate::AnimationLoop).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoopSettings {
    /// Name shown in log output.
    pub label: Option<String>,
    /// Throttle interval in seconds; `None` fires on every frame.
    pub interval: Option<f64>,
}

impl LoopSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label used in log output.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Throttle callbacks to one firing per `seconds`.
    ///
    /// Non-positive or non-finite values leave the loop unthrottled.
    pub fn with_interval(mut self, seconds: f64) -> Self {
        self.interval = Some(seconds);
        self
    }

    /// The interval the loop will actually use.
    pub fn effective_interval(&self) -> Option<f64> {
        normalize_interval(self.interval)
    }
}

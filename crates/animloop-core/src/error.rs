use thiserror::Error;

/// Errors raised by loop lifecycle and composition operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoopError {
    /// The operation cannot run in the loop's current configuration.
    #[error("invalid lifecycle operation: {0}")]
    InvalidLifecycleOperation(&'static str),
    /// The loop cannot be attached to the requested parent.
    #[error("invalid child attachment: {0}")]
    InvalidAttachment(&'static str),
}

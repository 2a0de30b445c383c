//! Bridge error types

use thiserror::Error;

/// Errors raised by the bridge itself, before any work reaches the runtime
/// thread. Errors produced by submitted work are never wrapped in this type;
/// they flow back to the caller unchanged.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Raised by `wrap_context`/`enter_context` when the resource/factory
    /// arguments are not mutually exclusive.
    #[error("exactly one of resource or factory must be given")]
    ExactlyOneSource,

    /// The run loop has been stopped; the bridge accepts no further work.
    #[error("bridge is closed")]
    Closed,

    /// A scoped resource was opened twice.
    #[error("resource already entered")]
    AlreadyEntered,

    /// A scoped resource was exited without having been entered.
    #[error("resource not entered")]
    NotEntered,

    /// A scoped resource was exited twice.
    #[error("resource already exited")]
    AlreadyExited,
}

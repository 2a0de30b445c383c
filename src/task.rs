//! Blocking submission of one future onto the runtime thread
//!
//! Each call spawns the future onto the runtime (a thread-safe operation
//! from any thread) and parks the calling thread on the join handle. The
//! join handle is the per-call result slot: one per submission, consumed by
//! the wait, independent of any other in-flight call.

use std::future::Future;
use std::panic;

use tokio::runtime::Handle;
use tracing::trace;

/// Spawn `future` onto the runtime behind `handle` and block the calling
/// thread until it resolves.
///
/// The outcome comes back exactly as the future produced it: a value is
/// returned unchanged, and a panic inside the future is resumed on the
/// calling thread with its original payload. A future still pending when
/// the runtime is torn down is cancelled by the runtime; its waiter panics.
pub(crate) fn submit_and_wait<F>(handle: &Handle, future: F) -> F::Output
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    trace!("submitting task to run loop");
    let join = handle.spawn(future);
    match futures::executor::block_on(join) {
        Ok(value) => value,
        Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
        Err(err) => panic!("task on the run loop was cancelled: {err}"),
    }
}

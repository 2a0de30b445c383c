//! Bridge - the sync-facing surface over the run loop
//!
//! One bridge owns one run loop thread and one stack of resources entered
//! through it. Any number of caller threads may submit work concurrently;
//! each call blocks its own thread and resolves independently of the rest.

use std::future::Future;

use anyhow::Result;
use futures::Stream;
use tokio::runtime::Handle;

use crate::config::RunLoopConfig;
use crate::error::BridgeError;
use crate::iter::BlockingIter;
use crate::runloop::RunLoop;
use crate::scoped::{AsyncScoped, ScopedGuard};
use crate::stack::ResourceStack;

/// Run async code from sync code over a dedicated runtime thread.
pub struct Bridge {
    runloop: RunLoop,
    stack: ResourceStack,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(RunLoopConfig::default())
    }
}

impl Bridge {
    /// Create a bridge. The runtime thread starts lazily on first use.
    pub fn new(config: RunLoopConfig) -> Self {
        Self {
            runloop: RunLoop::new(config),
            stack: ResourceStack::new(),
        }
    }

    /// Handle to the runtime on the loop thread, starting it if needed.
    /// The handle is only returned once the runtime is actually live.
    pub fn handle(&self) -> Result<Handle> {
        self.runloop.ensure_started()
    }

    /// Submit a future onto the loop thread and block until it resolves.
    ///
    /// The outcome is whatever the future produced, unchanged: values,
    /// `Result`s, and panics all come back as if the caller had awaited the
    /// future itself. Callable from any thread.
    ///
    /// # Panics
    ///
    /// Panics if the bridge is closed or the runtime cannot be built.
    /// Calling this from the loop thread itself blocks the scheduler and
    /// deadlocks.
    pub fn run<F>(&self, future: F) -> F::Output
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runloop.run(future)
    }

    /// Wrap an async scoped resource, or a factory producing one, into a
    /// sync guard. Exactly one of `resource` and `factory` must be given;
    /// a factory runs on the loop thread.
    pub fn wrap_context<C, F>(
        &self,
        resource: Option<C>,
        factory: Option<F>,
    ) -> Result<ScopedGuard<'_, C>>
    where
        C: AsyncScoped + 'static,
        F: FnOnce() -> C + Send + 'static,
    {
        let resource = match (resource, factory) {
            (Some(_), Some(_)) | (None, None) => {
                return Err(BridgeError::ExactlyOneSource.into());
            }
            (Some(resource), None) => resource,
            (None, Some(factory)) => self.run(async move { factory() }),
        };
        Ok(ScopedGuard::new(self, resource))
    }

    /// Open a scoped resource and keep it open until the bridge closes.
    ///
    /// The entered value is returned; the exit obligation goes onto the
    /// bridge's resource stack and runs, with no error to report, when
    /// [`Bridge::close`] unwinds the stack in reverse acquisition order.
    pub fn enter_context<C, F>(
        &self,
        resource: Option<C>,
        factory: Option<F>,
    ) -> Result<C::Value>
    where
        C: AsyncScoped + 'static,
        F: FnOnce() -> C + Send + 'static,
    {
        let mut guard = self.wrap_context(resource, factory)?;
        let value = guard.open()?;
        let resource = guard.into_entered();
        self.stack.push(Box::new(move |run_loop| {
            let mut resource = resource;
            let (outcome, _resource) = run_loop.run(async move {
                let outcome = resource.exit(None).await;
                (outcome, resource)
            });
            outcome.map(|_suppress| ())
        }));
        Ok(value)
    }

    /// View an async stream as a blocking iterator, one element per pull.
    pub fn wrap_iter<S>(&self, stream: S) -> BlockingIter<'_, S>
    where
        S: Stream + Send + Unpin + 'static,
        S::Item: Send + 'static,
    {
        BlockingIter::new(self, stream)
    }

    /// Exit every resource on the stack, most recent first, then stop the
    /// loop thread and wait for it to finish.
    ///
    /// A failing exit does not stop the unwind; the first error is returned
    /// after the stack is drained and the loop has stopped. Idempotent: a
    /// second call finds nothing to unwind and nothing to join. Blocks
    /// without a timeout; in-flight work is not cancelled, only the
    /// scheduler is asked to stop.
    pub fn close(&self) -> Result<()> {
        let unwound = self.stack.unwind(&self.runloop);
        let stopped = self.runloop.stop_and_join();
        unwound?;
        stopped
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

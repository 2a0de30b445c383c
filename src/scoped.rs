//! Scoped resources - async enter/exit driven from sync code
//!
//! An async scoped resource pairs an enter capability producing a value with
//! an exit capability that sees any error escaping the block and may elect
//! to suppress it. Sync callers cannot await either side, so the guard
//! replays both on the runtime thread and rebuilds the block contract by
//! hand: exit runs exactly once on every path, suppression is opt-in, and
//! an unsuppressed error comes back to the caller as the same object.

use anyhow::{Error, Result};
use async_trait::async_trait;

use crate::bridge::Bridge;
use crate::error::BridgeError;

/// A resource with paired async enter/exit capabilities.
///
/// `exit` receives the error escaping the block, if any, and returns `true`
/// to suppress it.
#[async_trait]
pub trait AsyncScoped: Send {
    /// Value produced by entering the resource.
    type Value: Send + 'static;

    /// Acquire the resource and produce its value.
    async fn enter(&mut self) -> Result<Self::Value>;

    /// Release the resource. `error` is the error escaping the block, or
    /// `None` on a clean exit. Returning `true` suppresses the error.
    async fn exit(&mut self, error: Option<&Error>) -> Result<bool>;
}

/// Where a scoped resource is in its lifecycle. Each edge is taken at most
/// once and never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    NotEntered,
    Entered,
    Exited,
}

/// Sync guard over one async scoped resource.
///
/// The resource is moved into each submitted future and handed back with
/// the outcome, so enter/exit run on the runtime thread while the guard
/// keeps ownership between calls.
pub struct ScopedGuard<'a, C: AsyncScoped + 'static> {
    bridge: &'a Bridge,
    resource: Option<C>,
    state: ScopeState,
}

impl<C: AsyncScoped + 'static> std::fmt::Debug for ScopedGuard<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedGuard")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a, C> ScopedGuard<'a, C>
where
    C: AsyncScoped + 'static,
{
    pub(crate) fn new(bridge: &'a Bridge, resource: C) -> Self {
        Self {
            bridge,
            resource: Some(resource),
            state: ScopeState::NotEntered,
        }
    }

    pub fn state(&self) -> ScopeState {
        self.state
    }

    /// Run the enter capability on the runtime thread and return its value.
    /// The guard only moves to entered once enter succeeds.
    pub fn open(&mut self) -> Result<C::Value> {
        match self.state {
            ScopeState::NotEntered => {}
            ScopeState::Entered => return Err(BridgeError::AlreadyEntered.into()),
            ScopeState::Exited => return Err(BridgeError::AlreadyExited.into()),
        }
        let mut resource = self.take_resource();
        let (outcome, resource) = self.bridge.run(async move {
            let outcome = resource.enter().await;
            (outcome, resource)
        });
        self.resource = Some(resource);
        let value = outcome?;
        self.state = ScopeState::Entered;
        Ok(value)
    }

    /// Run the exit capability on the runtime thread.
    ///
    /// `error` is the error escaping the caller's block, or `None` on a
    /// clean exit. Returns `Ok(None)` when there was no error or the exit
    /// capability suppressed it, `Ok(Some(error))` when the original error
    /// should be re-raised by the caller, and `Err` when the exit capability
    /// itself failed.
    pub fn exit(&mut self, error: Option<Error>) -> Result<Option<Error>> {
        match self.state {
            ScopeState::Entered => {}
            ScopeState::NotEntered => return Err(BridgeError::NotEntered.into()),
            ScopeState::Exited => return Err(BridgeError::AlreadyExited.into()),
        }
        let mut resource = self.take_resource();
        let (outcome, resource, error) = self.bridge.run(async move {
            let outcome = resource.exit(error.as_ref()).await;
            (outcome, resource, error)
        });
        self.resource = Some(resource);
        self.state = ScopeState::Exited;
        let suppress = outcome?;
        if suppress {
            Ok(None)
        } else {
            Ok(error)
        }
    }

    /// Scoped-block form: enter, run `body` with the value, always exit.
    ///
    /// On a clean block this returns `Ok(Some(result))`. When `body` fails
    /// the exit capability sees the error; `Ok(None)` means it was
    /// suppressed, otherwise the original error is returned unchanged. An
    /// error from the exit capability itself takes precedence.
    pub fn with<R>(mut self, body: impl FnOnce(C::Value) -> Result<R>) -> Result<Option<R>> {
        let value = self.open()?;
        match body(value) {
            Ok(result) => {
                self.exit(None)?;
                Ok(Some(result))
            }
            Err(err) => match self.exit(Some(err))? {
                None => Ok(None),
                Some(err) => Err(err),
            },
        }
    }

    /// Detach the entered resource so its exit can be deferred elsewhere.
    pub(crate) fn into_entered(mut self) -> C {
        self.take_resource()
    }

    fn take_resource(&mut self) -> C {
        self.resource
            .take()
            .expect("scoped resource missing outside a submitted call")
    }
}

//! Run loop - a dedicated thread driving a current-thread Tokio runtime
//!
//! The loop starts lazily on first use. The spawning caller blocks on a
//! readiness channel until the background thread has built the runtime, so a
//! handle is never visible before the runtime exists. Exactly one background
//! thread is ever started per loop; once stopped, the loop never restarts.

use std::mem;
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::debug;

use crate::config::RunLoopConfig;
use crate::error::BridgeError;
use crate::task;

/// Owns the background thread and the runtime running on it
pub(crate) struct RunLoop {
    config: RunLoopConfig,
    state: Mutex<LoopState>,
}

enum LoopState {
    Idle,
    Running(LoopInner),
    Stopped,
}

struct LoopInner {
    handle: Handle,
    stop: Option<oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunLoop {
    pub(crate) fn new(config: RunLoopConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LoopState::Idle),
        }
    }

    /// Start the background thread if it is not running yet and return the
    /// runtime handle. Concurrent first calls race on the state lock; only
    /// the winner spawns a thread.
    pub(crate) fn ensure_started(&self) -> Result<Handle> {
        let mut state = self.state.lock().expect("run loop state lock poisoned");
        match &*state {
            LoopState::Running(inner) => return Ok(inner.handle.clone()),
            LoopState::Stopped => return Err(BridgeError::Closed.into()),
            LoopState::Idle => {}
        }

        let (ready_tx, ready_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let config = self.config.clone();

        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                let rt = match config.build_runtime() {
                    Ok(rt) => rt,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(rt.handle().clone()));
                // Drive spawned tasks until the stop signal arrives (or the
                // sender is dropped). No timeout: a task that never yields
                // wedges the loop and the eventual join.
                rt.block_on(async {
                    let _ = stop_rx.await;
                });
                debug!("run loop stopped");
            })
            .context("failed to spawn run loop thread")?;

        // Readiness barrier: wait for the runtime to exist before publishing
        // the handle to anyone.
        let handle = ready_rx
            .recv()
            .context("run loop thread exited before signaling readiness")?
            .context("failed to build runtime for run loop")?;

        debug!(thread = %self.config.thread_name, "run loop started");
        *state = LoopState::Running(LoopInner {
            handle: handle.clone(),
            stop: Some(stop_tx),
            thread: Some(thread),
        });
        Ok(handle)
    }

    /// Submit a future onto the loop and block until it resolves.
    ///
    /// Panics if the loop cannot be started (runtime build failure or the
    /// bridge already closed). Calling this from the run loop thread itself
    /// blocks the scheduler and deadlocks.
    pub(crate) fn run<F>(&self, future: F) -> F::Output
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match self.ensure_started() {
            Ok(handle) => task::submit_and_wait(&handle, future),
            Err(err) => panic!("run loop unavailable: {err:#}"),
        }
    }

    /// Signal the runtime to stop and wait for the background thread to
    /// exit. Idempotent; a loop that never started just transitions to
    /// stopped. Blocks without a timeout.
    pub(crate) fn stop_and_join(&self) -> Result<()> {
        let mut state = self.state.lock().expect("run loop state lock poisoned");
        match mem::replace(&mut *state, LoopState::Stopped) {
            LoopState::Running(mut inner) => {
                if let Some(stop) = inner.stop.take() {
                    let _ = stop.send(());
                }
                if let Some(thread) = inner.thread.take() {
                    if thread.join().is_err() {
                        anyhow::bail!("run loop thread panicked");
                    }
                }
                Ok(())
            }
            LoopState::Idle | LoopState::Stopped => Ok(()),
        }
    }
}

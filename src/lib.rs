//! Run async code from sync code.
//!
//! A [`Bridge`] owns a dedicated background thread driving a current-thread
//! Tokio runtime. Synchronous callers submit futures onto that runtime and
//! block until the result comes back, use async scoped resources through a
//! guard that replays enter/exit on the runtime thread, and walk async
//! streams as plain iterators.
//!
//! ```
//! let bridge = tether::Bridge::default();
//! let value = bridge.run(async { 1 + 1 });
//! assert_eq!(value, 2);
//! ```

mod bridge;
mod config;
mod error;
mod iter;
mod runloop;
mod scoped;
mod stack;
mod task;

pub use bridge::Bridge;
pub use config::RunLoopConfig;
pub use error::BridgeError;
pub use iter::BlockingIter;
pub use scoped::{AsyncScoped, ScopeState, ScopedGuard};

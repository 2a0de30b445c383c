//! Run loop configuration

use std::io;

use tokio::runtime::{Builder, Runtime};

/// Options forwarded to the runtime constructor. The bridge does not
/// interpret them beyond applying them to the builder.
#[derive(Debug, Clone)]
pub struct RunLoopConfig {
    /// Name given to the background thread.
    pub thread_name: String,
    /// Enable the I/O driver on the runtime.
    pub enable_io: bool,
    /// Enable the time driver on the runtime.
    pub enable_time: bool,
}

impl Default for RunLoopConfig {
    fn default() -> Self {
        Self {
            thread_name: "tether-loop".to_string(),
            enable_io: true,
            enable_time: true,
        }
    }
}

impl RunLoopConfig {
    /// Build a current-thread runtime with these options applied
    pub(crate) fn build_runtime(&self) -> io::Result<Runtime> {
        let mut builder = Builder::new_current_thread();
        if self.enable_io {
            builder.enable_io();
        }
        if self.enable_time {
            builder.enable_time();
        }
        builder.build()
    }
}

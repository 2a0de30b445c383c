//! Resource stack - deferred exit obligations in acquisition order

use std::sync::Mutex;

use anyhow::Result;

use crate::runloop::RunLoop;

/// One deferred exit: runs the resource's exit capability on the loop.
pub(crate) type UnwindFn = Box<dyn FnOnce(&RunLoop) -> Result<()> + Send>;

/// Resources entered through the bridge, unwound in reverse order when the
/// bridge closes. Entries leave the stack as they exit.
pub(crate) struct ResourceStack {
    entries: Mutex<Vec<UnwindFn>>,
}

impl ResourceStack {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, entry: UnwindFn) {
        self.entries
            .lock()
            .expect("resource stack lock poisoned")
            .push(entry);
    }

    /// Pop and run every exit obligation, most recent first. A failing exit
    /// does not stop the unwind; the first error is reported once the stack
    /// is drained.
    pub(crate) fn unwind(&self, run_loop: &RunLoop) -> Result<()> {
        let mut first_err = None;
        loop {
            // Entries run outside the lock; they block on the loop.
            let entry = self
                .entries
                .lock()
                .expect("resource stack lock poisoned")
                .pop();
            let Some(entry) = entry else { break };
            if let Err(err) = entry(run_loop) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunLoopConfig;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_unwind_runs_in_reverse_order() {
        let stack = ResourceStack::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            stack.push(Box::new(move |_| {
                order.lock().unwrap().push(name);
                Ok(())
            }));
        }
        let run_loop = RunLoop::new(RunLoopConfig::default());
        stack.unwind(&run_loop).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_unwind_continues_past_failures() {
        let stack = ResourceStack::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            stack.push(Box::new(move |_| {
                order.lock().unwrap().push(name);
                if name == "b" {
                    anyhow::bail!("exit failed for {name}");
                }
                Ok(())
            }));
        }
        let run_loop = RunLoop::new(RunLoopConfig::default());
        let err = stack.unwind(&run_loop).unwrap_err();
        assert_eq!(err.to_string(), "exit failed for b");
        assert_eq!(*order.lock().unwrap(), vec!["c", "b", "a"]);
    }
}

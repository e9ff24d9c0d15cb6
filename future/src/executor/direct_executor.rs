// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! An executor that runs work inline on the calling thread. See [`DirectExecutor`].

use super::{Executor, RejectedWorkUnit, WorkUnit};

/// Runs every work unit immediately, on the thread that submitted it.
///
/// Useful in tests (listener delivery becomes deterministic and single-threaded, so
/// addition order is observable) and for callers that already sit on a worker thread.
/// Never rejects.
///
/// Note that with this executor, listener bodies run on whichever thread completed
/// the future - a listener that blocks will block the completer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectExecutor;

impl Executor for DirectExecutor {
    fn execute(&self, work_unit: WorkUnit) -> Result<(), RejectedWorkUnit> {
        work_unit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc,
                    atomic::{AtomicBool, Ordering}};

    #[test]
    fn runs_inline() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        DirectExecutor
            .execute(Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }
}

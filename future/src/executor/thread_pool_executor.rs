// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A fixed pool of named worker threads draining an [`mpsc`] channel. See
//! [`ThreadPoolExecutor`] for details.
//!
//! [`mpsc`]: std::sync::mpsc

use super::{Executor, RejectedWorkUnit, WorkUnit};
use std::{panic::{AssertUnwindSafe, catch_unwind},
          sync::{Arc, Mutex, PoisonError, mpsc},
          thread};

/// A fixed-size pool of worker threads fed by a single channel.
///
/// - Workers compete for jobs by locking the shared receiver; a blocked listener on
///   one worker does not stall submission, only that worker.
/// - Worker bodies are [`catch_unwind`]-guarded: a panicking work unit is logged and
///   the worker keeps draining.
/// - [`shutdown()`] closes the channel. Already-queued work still drains; later
///   [`execute()`] calls are rejected with the work unit returned to the caller.
///
/// [`catch_unwind`]: std::panic::catch_unwind
/// [`execute()`]: Executor::execute
/// [`shutdown()`]: Self::shutdown
#[allow(missing_debug_implementations)]
pub struct ThreadPoolExecutor {
    sender: Mutex<Option<mpsc::Sender<WorkUnit>>>,
}

impl ThreadPoolExecutor {
    /// Spawns `pool_size` (at least 1) workers named `{thread_name_prefix}-{index}`.
    #[must_use]
    pub fn new(pool_size: usize, thread_name_prefix: &str) -> Self {
        let (sender, receiver) = mpsc::channel::<WorkUnit>();
        let shared_receiver = Arc::new(Mutex::new(receiver));

        for index in 0..pool_size.max(1) {
            let receiver = Arc::clone(&shared_receiver);
            let name = format!("{thread_name_prefix}-{index}");
            let spawn_result = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_loop(&receiver));
            if let Err(error) = spawn_result {
                tracing::warn!(%name, %error, "failed to spawn pool worker thread");
            }
        }

        Self {
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Closes the submission channel. Queued work still drains; new submissions are
    /// rejected. Idempotent.
    pub fn shutdown(&self) {
        drop(
            self.sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
    }
}

impl Executor for ThreadPoolExecutor {
    fn execute(&self, work_unit: WorkUnit) -> Result<(), RejectedWorkUnit> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(sender) => sender
                .send(work_unit)
                .map_err(|returned| {
                    RejectedWorkUnit::with_work(returned.0, "all pool workers exited")
                }),
            None => Err(RejectedWorkUnit::with_work(
                work_unit,
                "executor has been shut down",
            )),
        }
    }
}

fn worker_loop(receiver: &Arc<Mutex<mpsc::Receiver<WorkUnit>>>) {
    loop {
        let next_job = {
            let guard = receiver.lock().unwrap_or_else(PoisonError::into_inner);
            guard.recv()
        };
        match next_job {
            Ok(work_unit) => {
                if catch_unwind(AssertUnwindSafe(work_unit)).is_err() {
                    tracing::warn!("work unit panicked on pool worker; worker continues");
                }
            }
            // Channel closed and drained: pool is shutting down.
            Err(mpsc::RecvError) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::mpsc::channel, time::Duration};

    #[test]
    fn runs_submitted_work() {
        let pool = ThreadPoolExecutor::new(2, "test-pool");
        let (tx, rx) = channel();
        pool.execute(Box::new(move || tx.send(42).unwrap())).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
        pool.shutdown();
    }

    #[test]
    fn rejects_after_shutdown() {
        let pool = ThreadPoolExecutor::new(1, "test-pool-shutdown");
        pool.shutdown();
        let rejected = pool.execute(Box::new(|| {})).unwrap_err();
        assert!(rejected.work_unit.is_some());
        assert!(rejected.reason.contains("shut down"));
    }

    #[test]
    fn survives_panicking_work_unit() {
        let pool = ThreadPoolExecutor::new(1, "test-pool-panic");
        pool.execute(Box::new(|| panic!("boom"))).unwrap();

        // The single worker must still be alive to run this.
        let (tx, rx) = channel();
        pool.execute(Box::new(move || tx.send(7).unwrap())).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
        pool.shutdown();
    }
}

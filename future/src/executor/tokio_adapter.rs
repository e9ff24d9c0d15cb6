// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [`Executor`] / [`Scheduler`] adapters over a [`tokio::runtime::Handle`]. See
//! [`TokioExecutor`] and [`TokioScheduler`] for details.

use super::{Executor, RejectedWorkUnit, ScheduledWorkUnitHandle, Scheduler, WorkUnit};
use std::{panic::{AssertUnwindSafe, catch_unwind},
          time::Duration};
use tokio::runtime::Handle;

/// Runs work units on a tokio runtime's blocking pool.
///
/// Work units may block (listener bodies are allowed to), so they go through
/// [`spawn_blocking`] rather than onto the async worker threads.
///
/// A handle whose runtime has shut down rejects submissions; the work unit cannot be
/// recovered in that case because the hand-off fails inside tokio.
///
/// [`spawn_blocking`]: tokio::runtime::Handle::spawn_blocking
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    #[must_use]
    pub fn new(handle: Handle) -> Self { Self { handle } }

    /// Adapter over the runtime the caller is currently inside, if any.
    #[must_use]
    pub fn try_current() -> Option<Self> { Handle::try_current().ok().map(Self::new) }
}

impl Executor for TokioExecutor {
    fn execute(&self, work_unit: WorkUnit) -> Result<(), RejectedWorkUnit> {
        spawn_blocking_on(&self.handle, work_unit)
    }
}

/// Like [`TokioExecutor`], plus delayed scheduling via [`tokio::time::sleep`] with
/// abort-based cancellation.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    #[must_use]
    pub fn new(handle: Handle) -> Self { Self { handle } }

    /// Adapter over the runtime the caller is currently inside, if any.
    #[must_use]
    pub fn try_current() -> Option<Self> { Handle::try_current().ok().map(Self::new) }
}

impl Executor for TokioScheduler {
    fn execute(&self, work_unit: WorkUnit) -> Result<(), RejectedWorkUnit> {
        spawn_blocking_on(&self.handle, work_unit)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(
        &self,
        delay: Duration,
        work_unit: WorkUnit,
    ) -> Result<ScheduledWorkUnitHandle, RejectedWorkUnit> {
        let handle = self.handle.clone();
        let spawn_result = catch_unwind(AssertUnwindSafe(move || {
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                // The unit may block; move it off the async workers.
                drop(tokio::task::spawn_blocking(work_unit));
            })
        }));
        match spawn_result {
            Ok(join_handle) => Ok(ScheduledWorkUnitHandle::from_cancel_fn(move || {
                join_handle.abort();
            })),
            Err(_) => Err(RejectedWorkUnit::lost("tokio runtime is shutting down")),
        }
    }
}

/// Spawning panics when the backing runtime is gone; map that to a rejection.
fn spawn_blocking_on(handle: &Handle, work_unit: WorkUnit) -> Result<(), RejectedWorkUnit> {
    let handle = handle.clone();
    catch_unwind(AssertUnwindSafe(move || {
        drop(handle.spawn_blocking(work_unit));
    }))
    .map_err(|_| RejectedWorkUnit::lost("tokio runtime is shutting down"))
}

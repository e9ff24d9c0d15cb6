// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The capabilities the future core consumes: run a work unit later, and run one after
//! a delay. See [`Executor`] and [`Scheduler`] for details.

use std::{error::Error,
          fmt::{Display, Formatter, Result as FmtResult}};

/// A unit of work handed to an [`Executor`].
pub type WorkUnit = Box<dyn FnOnce() + Send + 'static>;

/// Something that accepts a work unit and runs it later on some thread.
///
/// The future core never spawns threads of its own; listener notification and task
/// execution both flow through this capability. Implementations may reject a
/// submission (typically during shutdown) by returning the work unit to the caller -
/// on the notification path the core logs the rejection and drops the work, leaving
/// the future's outcome untouched.
pub trait Executor: Send + Sync + 'static {
    /// Accepts `work_unit` for later execution.
    ///
    /// # Errors
    ///
    /// [`RejectedWorkUnit`] when the executor cannot accept work (shut down, or its
    /// backing runtime is gone).
    fn execute(&self, work_unit: WorkUnit) -> Result<(), RejectedWorkUnit>;
}

/// An [`Executor`] that additionally supports delayed one-shot scheduling. Consumed
/// only by the [`timeout`] operator.
///
/// [`timeout`]: crate::Future::timeout
pub trait Scheduler: Executor {
    /// Accepts `work_unit` to run once, `delay` from now. The returned handle cancels
    /// the pending run (a best-effort no-op if it already ran).
    ///
    /// # Errors
    ///
    /// [`RejectedWorkUnit`] when the scheduler cannot accept work.
    fn schedule(
        &self,
        delay: std::time::Duration,
        work_unit: WorkUnit,
    ) -> Result<ScheduledWorkUnitHandle, RejectedWorkUnit>;
}

/// Cancels a work unit previously accepted by [`Scheduler::schedule`].
pub struct ScheduledWorkUnitHandle {
    cancel_fn: Box<dyn FnOnce() + Send + 'static>,
}

impl std::fmt::Debug for ScheduledWorkUnitHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledWorkUnitHandle").finish_non_exhaustive()
    }
}

impl ScheduledWorkUnitHandle {
    /// Builds a handle from the scheduler-specific cancellation action.
    #[must_use]
    pub fn from_cancel_fn(cancel_fn: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel_fn: Box::new(cancel_fn),
        }
    }

    /// Cancels the pending work unit. Harmless if it already ran.
    pub fn cancel(self) { (self.cancel_fn)(); }
}

/// A work unit an executor refused to accept.
///
/// Carries the work unit back when the hand-off failed cleanly; `work_unit` is
/// [`None`] when the unit was lost mid-transfer (e.g. a backing runtime tore down
/// while accepting it).
#[allow(missing_debug_implementations)]
pub struct RejectedWorkUnit {
    /// The returned work unit, when recoverable.
    pub work_unit: Option<WorkUnit>,
    /// Why the executor refused.
    pub reason: &'static str,
}

impl RejectedWorkUnit {
    #[must_use]
    pub fn with_work(work_unit: WorkUnit, reason: &'static str) -> Self {
        Self {
            work_unit: Some(work_unit),
            reason,
        }
    }

    #[must_use]
    pub fn lost(reason: &'static str) -> Self {
        Self {
            work_unit: None,
            reason,
        }
    }
}

impl std::fmt::Debug for RejectedWorkUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RejectedWorkUnit")
            .field("reason", &self.reason)
            .field("work_unit_recovered", &self.work_unit.is_some())
            .finish()
    }
}

impl Display for RejectedWorkUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "executor rejected work unit: {}", self.reason)
    }
}

impl Error for RejectedWorkUnit {}

/// Submits `work_unit` on the notification path: a rejection is logged and the work is
/// dropped, per the core's executor-rejection policy.
pub(crate) fn execute_or_log(executor: &dyn Executor, work_unit: WorkUnit) {
    if let Err(rejected) = executor.execute(work_unit) {
        tracing::warn!(reason = rejected.reason, "dropping notification work unit");
    }
}

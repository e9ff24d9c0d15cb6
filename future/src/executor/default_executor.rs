// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Process-wide default [`Executor`] and [`Scheduler`] cells.
//!
//! Futures constructed without an executor fall back to [`default_executor()`] for
//! listener delivery. Both cells are write-once: either the host installs its own
//! implementation before first use, or the built-in fallback is lazily initialised on
//! first access and kept for the process lifetime. There is no tear-down - the
//! fallbacks are shared process infrastructure, like a global logger.

use super::{Executor, Scheduler, ThreadPoolExecutor, TimerScheduler};
use std::sync::{Arc, OnceLock};

static DEFAULT_EXECUTOR: OnceLock<Arc<dyn Executor>> = OnceLock::new();
static DEFAULT_SCHEDULER: OnceLock<Arc<dyn Scheduler>> = OnceLock::new();

/// Worker count of the fallback notification pool. Listener bodies may block, so one
/// thread is not enough; more than a couple is waste for notification traffic.
pub const DEFAULT_POOL_THREAD_COUNT: usize = 2;

/// Whether an [`install_default_executor`] / [`install_default_scheduler`] call took
/// effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The supplied implementation is now the process-wide default.
    Installed,
    /// A default was already initialised (installed or lazily created); the supplied
    /// implementation was dropped.
    AlreadyInitialized,
}

/// The process-wide default executor, lazily a [`ThreadPoolExecutor`].
#[must_use]
pub fn default_executor() -> Arc<dyn Executor> {
    Arc::clone(DEFAULT_EXECUTOR.get_or_init(|| {
        Arc::new(ThreadPoolExecutor::new(
            DEFAULT_POOL_THREAD_COUNT,
            "r3bl-future-notify",
        ))
    }))
}

/// Installs the process-wide default executor. Succeeds at most once, and only if
/// [`default_executor()`] has not already initialised the fallback.
pub fn install_default_executor(executor: Arc<dyn Executor>) -> InstallOutcome {
    match DEFAULT_EXECUTOR.set(executor) {
        Ok(()) => InstallOutcome::Installed,
        Err(_rejected) => InstallOutcome::AlreadyInitialized,
    }
}

/// The process-wide default scheduler, lazily a [`TimerScheduler`].
#[must_use]
pub fn default_scheduler() -> Arc<dyn Scheduler> {
    Arc::clone(DEFAULT_SCHEDULER.get_or_init(|| Arc::new(TimerScheduler::new())))
}

/// Installs the process-wide default scheduler. Succeeds at most once, and only if
/// [`default_scheduler()`] has not already initialised the fallback.
pub fn install_default_scheduler(scheduler: Arc<dyn Scheduler>) -> InstallOutcome {
    match DEFAULT_SCHEDULER.set(scheduler) {
        Ok(()) => InstallOutcome::Installed,
        Err(_rejected) => InstallOutcome::AlreadyInitialized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Both calls touch the same process-wide cell, so one test covers the pair of
    /// behaviors: lazy initialisation, then rejection of a late install.
    #[test]
    fn lazy_init_then_install_is_rejected() {
        let first = default_executor();
        let second = default_executor();
        assert!(Arc::ptr_eq(&first, &second));

        let outcome = install_default_executor(Arc::new(super::super::DirectExecutor));
        assert_eq!(outcome, InstallOutcome::AlreadyInitialized);
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The settable, listenable, cancellable future handle. See [`Future`] for details.

use super::shared_state::SharedState;
use crate::{error::{Cause, FutureError, FutureResult},
            executor::{Executor, default_executor},
            state::{CompletionState, PolledOutcome, SettledOutcome}};
use std::sync::{Arc, PoisonError};

/// A one-shot asynchronous outcome: a value, a failure, or a cancellation.
///
/// One concrete type plays every role the library needs:
///
/// - **Settable**: producers complete it with [`try_succeed`] / [`try_fail`] (racing,
///   `bool`-returning) or [`set_success`] / [`set_failure`] (raising on a lost race).
/// - **Listenable**: consumers register exactly-once callbacks with [`add_listener`]
///   and friends, delivered through the future's executor.
/// - **Blockable**: threads wait with [`wait_done`], [`get`], [`sync`] and their timed
///   variants.
/// - **Cancellable**: [`cancel`] is a state transition (optionally delivering an
///   interrupt to an embedded task's runner thread), not a thread kill.
///
/// Handles are cheap clones of a shared inner; the future lives as long as its
/// longest-lived holder. Pre-completed futures come from [`succeeded`], [`failed`] and
/// [`cancelled`].
///
/// # Outcome model
///
/// Exactly one producer wins the completion race; the outcome is monotonic - once a
/// terminal state is observable it never changes, and observing it happens-after its
/// publication. Cancellation is a specialised failure: [`is_failed`] is `true` for it
/// and [`get_cause`] reports the lean [`CancelledError`] cause, while [`is_cancelled`]
/// distinguishes it from an ordinary failure.
///
/// ```
/// use r3bl_future::Future;
///
/// let future = Future::<i32>::new();
/// assert!(future.try_succeed(42));
/// assert!(!future.try_succeed(43)); // completion race already settled
/// assert_eq!(future.get_now(), Some(42));
/// ```
///
/// [`CancelledError`]: crate::error::CancelledError
/// [`add_listener`]: Self::add_listener
/// [`cancel`]: Self::cancel
/// [`cancelled`]: Self::cancelled
/// [`failed`]: Self::failed
/// [`get`]: Self::get
/// [`get_cause`]: Self::get_cause
/// [`is_cancelled`]: Self::is_cancelled
/// [`is_failed`]: Self::is_failed
/// [`set_failure`]: Self::set_failure
/// [`set_success`]: Self::set_success
/// [`succeeded`]: Self::succeeded
/// [`sync`]: Self::sync
/// [`try_fail`]: Self::try_fail
/// [`try_succeed`]: Self::try_succeed
/// [`wait_done`]: Self::wait_done
pub struct Future<T> {
    pub(crate) inner: Arc<SharedState<T>>,
}

/// A terminal outcome, as seen by code that runs only after completion (listener
/// bodies, post-wait reporting).
pub(crate) enum CompletedOutcome<T> {
    Success(T),
    Failure(Cause),
    Cancelled(Cause),
}

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// An incomplete future that will deliver notifications through the process-wide
    /// default executor.
    #[must_use]
    pub fn new() -> Self { Self::with_executor_opt(None) }

    /// An incomplete future that delivers notifications through `executor`.
    #[must_use]
    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self::with_executor_opt(Some(executor))
    }

    pub(crate) fn with_executor_opt(executor: Option<Arc<dyn Executor>>) -> Self {
        Self {
            inner: Arc::new(SharedState::new(executor)),
        }
    }

    /// A future already completed with `value`.
    #[must_use]
    pub fn succeeded(value: T) -> Self {
        let future = Self::new();
        let settled = future.inner.cell.try_settle(SettledOutcome::Succeeded(value));
        debug_assert!(settled);
        future
    }

    /// A future already completed with the failure `cause`.
    #[must_use]
    pub fn failed(cause: Cause) -> Self { Self::pre_failed(cause, None) }

    /// A future already cancelled.
    #[must_use]
    pub fn cancelled() -> Self { Self::pre_cancelled(None) }

    /// Pre-failed, with the given delivery executor. No notification machinery runs -
    /// there is nobody to notify yet; listeners added later observe done-ness at
    /// registration.
    pub(crate) fn pre_failed(cause: Cause, executor: Option<Arc<dyn Executor>>) -> Self {
        let future = Self::with_executor_opt(executor);
        let settled = future.inner.cell.try_settle(SettledOutcome::Failed(cause));
        debug_assert!(settled);
        future
    }

    /// Pre-cancelled, with the given delivery executor.
    pub(crate) fn pre_cancelled(executor: Option<Arc<dyn Executor>>) -> Self {
        let future = Self::with_executor_opt(executor);
        let cancelled = future.inner.cell.try_mark_cancelled(false);
        debug_assert!(cancelled);
        future
    }

    /// Attempts to complete with `value`. Returns `true` iff this call won the
    /// completion race; a `false` return has no side effects.
    pub fn try_succeed(&self, value: T) -> bool {
        if self.inner.cell.try_settle(SettledOutcome::Succeeded(value)) {
            self.finish_completion();
            true
        } else {
            false
        }
    }

    /// Attempts to complete with the failure `cause`. Returns `true` iff this call won
    /// the completion race.
    pub fn try_fail(&self, cause: Cause) -> bool {
        if self.inner.cell.try_settle(SettledOutcome::Failed(cause)) {
            self.finish_completion();
            true
        } else {
            false
        }
    }

    /// Completes with `value`.
    ///
    /// # Errors
    ///
    /// [`FutureError::AlreadyCompleted`] if another producer got there first. Use
    /// [`try_succeed`] when losing the race is an expected outcome.
    ///
    /// [`try_succeed`]: Self::try_succeed
    pub fn set_success(&self, value: T) -> FutureResult<()> {
        if self.try_succeed(value) {
            Ok(())
        } else {
            Err(FutureError::AlreadyCompleted {
                state: self.completion_state(),
            })
        }
    }

    /// Completes with the failure `cause`.
    ///
    /// # Errors
    ///
    /// [`FutureError::AlreadyCompleted`] if another producer got there first.
    pub fn set_failure(&self, cause: Cause) -> FutureResult<()> {
        if self.try_fail(cause) {
            Ok(())
        } else {
            Err(FutureError::AlreadyCompleted {
                state: self.completion_state(),
            })
        }
    }

    /// Cancels the future. Returns `true` iff this call won the completion race;
    /// cancelling an already-completed future returns `false` and changes nothing.
    ///
    /// With `may_interrupt`, the interrupt is delivered to the thread currently
    /// running this future's embedded task, if there is one (see [`TaskFuture`]); for
    /// a plain settable future the flag has no extra effect. Cancellation is a state
    /// transition - listeners already handed to the executor are not recalled.
    ///
    /// [`TaskFuture`]: crate::TaskFuture
    pub fn cancel(&self, may_interrupt: bool) -> bool {
        if !self.inner.cell.try_mark_cancelled(may_interrupt) {
            return false;
        }
        if may_interrupt {
            {
                let runner = self
                    .inner
                    .runner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if let Some(handle) = runner.as_ref() {
                    handle.interrupt();
                }
            }
            self.inner.cell.finish_interrupt();
        }
        self.finish_completion();
        true
    }

    /// Wakes every blocked waiter and hands the listener registry to the executor.
    /// Runs exactly once, on the thread that won the terminal transition.
    pub(crate) fn finish_completion(&self) {
        tracing::debug!(state = %self.completion_state(), "future reached terminal state");
        let detached = {
            let mut monitor = self.inner.lock_monitor();
            monitor.waiters.detach_all()
        };
        for waiter in detached {
            waiter.unpark();
        }
        self.schedule_notification();
    }

    /// The current lifecycle state. Mostly useful for diagnostics; prefer the
    /// classification predicates.
    #[must_use]
    pub fn completion_state(&self) -> CompletionState { self.inner.cell.state() }

    /// `true` once any producer has claimed the outcome.
    #[must_use]
    pub fn is_done(&self) -> bool { self.inner.cell.state().is_done() }

    /// `true` iff completed with a value.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.inner.cell.state() == CompletionState::Succeeded
    }

    /// `true` iff completed with a failure cause - which includes cancellation, a
    /// specialised failure. Use [`is_cancelled`] to tell the two apart.
    ///
    /// [`is_cancelled`]: Self::is_cancelled
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(
            self.inner.cell.state(),
            CompletionState::Failed
                | CompletionState::Cancelled
                | CompletionState::Interrupting
                | CompletionState::Interrupted
        )
    }

    /// `true` iff the future was cancelled (with or without interrupt delivery).
    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.inner.cell.state().is_cancelled() }

    /// `true` while the completion race is still open.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        self.inner.cell.state() == CompletionState::New
    }

    /// The failure cause: the published report for a failed future, the lean
    /// cancellation cause for a cancelled one, [`None`] for success or incomplete.
    /// Every caller sees the same shared instance.
    #[must_use]
    pub fn get_cause(&self) -> Option<Cause> { self.inner.cell.failure_cause() }

    /// The success value without blocking, or [`None`] if the future has not (yet)
    /// completed successfully.
    #[must_use]
    pub fn get_now(&self) -> Option<T> { self.inner.cell.success_value() }

    /// Observes the outcome without blocking.
    #[must_use]
    pub fn observe(&self) -> PolledOutcome<T> { self.inner.cell.observe() }

    /// The delivery executor: the one captured at construction, or the process
    /// default.
    #[must_use]
    pub fn executor(&self) -> Arc<dyn Executor> {
        self.inner
            .executor
            .clone()
            .unwrap_or_else(default_executor)
    }

    /// The outcome, for code that only runs after completion.
    pub(crate) fn completed_outcome(&self) -> CompletedOutcome<T> {
        match self.observe() {
            PolledOutcome::Success(value) => CompletedOutcome::Success(value),
            PolledOutcome::Failure(cause) => CompletedOutcome::Failure(cause),
            PolledOutcome::Cancelled(cause) => CompletedOutcome::Cancelled(cause),
            PolledOutcome::Pending => {
                unreachable!("completed_outcome() called before the terminal transition")
            }
        }
    }

    /// Whether two handles point at the same underlying future.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Future")
            .field("state", &self.inner.cell.state())
            .finish()
    }
}

impl<T> Default for Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CancelledError, cause_from_message};
    use pretty_assertions::assert_eq;
    use std::thread;

    #[test]
    fn starts_incomplete() {
        let future = Future::<i32>::new();
        assert!(!future.is_done());
        assert!(future.is_cancellable());
        assert_eq!(future.get_now(), None);
        assert_eq!(future.completion_state(), CompletionState::New);
    }

    #[test]
    fn try_succeed_settles_once() {
        let future = Future::new();
        assert!(future.try_succeed(1));
        assert!(!future.try_succeed(2));
        assert!(!future.try_fail(cause_from_message("late")));
        assert!(!future.cancel(false));
        assert!(future.is_success());
        assert!(!future.is_failed());
        assert_eq!(future.get_now(), Some(1));
    }

    #[test]
    fn set_success_raises_on_lost_race() {
        let future = Future::new();
        future.set_success(1).unwrap();
        let error = future.set_success(2).unwrap_err();
        assert!(matches!(
            error,
            FutureError::AlreadyCompleted {
                state: CompletionState::Succeeded
            }
        ));
    }

    #[test]
    fn failure_is_shared_by_observers() {
        let future: Future<i32> = Future::new();
        assert!(future.try_fail(cause_from_message("boom")));
        assert!(future.is_failed());
        assert!(!future.is_cancelled());
        let first = future.get_cause().unwrap();
        let second = future.get_cause().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn cancel_is_idempotent() {
        let future: Future<i32> = Future::new();
        assert!(future.cancel(false));
        assert!(!future.cancel(false));
        assert!(future.is_cancelled());
        assert!(future.is_failed());
        assert!(!future.is_success());
        let cause = future.get_cause().unwrap();
        assert!(cause.downcast_ref::<CancelledError>().is_some());
    }

    #[test]
    fn cancel_with_interrupt_and_no_runner() {
        let future: Future<i32> = Future::new();
        assert!(future.cancel(true));
        assert_eq!(future.completion_state(), CompletionState::Interrupted);
        assert!(future.is_cancelled());
    }

    #[test]
    fn pre_completed_constructors() {
        assert_eq!(Future::succeeded(5).get_now(), Some(5));
        let failed: Future<i32> = Future::failed(cause_from_message("nope"));
        assert!(failed.is_failed());
        let cancelled: Future<i32> = Future::cancelled();
        assert!(cancelled.is_cancelled());
    }

    /// Exactly one of many racing producers wins (universal invariant).
    #[test]
    fn concurrent_producers_single_winner() {
        const PRODUCER_COUNT: usize = 8;
        let future: Future<usize> = Future::new();

        let handles: Vec<_> = (0..PRODUCER_COUNT)
            .map(|index| {
                let future = future.clone();
                thread::spawn(move || {
                    if index % 3 == 0 {
                        future.cancel(false)
                    } else if index % 3 == 1 {
                        future.try_fail(cause_from_message("race"))
                    } else {
                        future.try_succeed(index)
                    }
                })
            })
            .collect();

        let winner_count = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winner_count, 1);
        assert!(future.is_done());
    }

    #[test]
    fn handles_share_state() {
        let a = Future::<i32>::new();
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        a.try_succeed(3);
        assert_eq!(b.get_now(), Some(3));
    }
}

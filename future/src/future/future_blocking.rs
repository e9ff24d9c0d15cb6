// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The blocking accessors: park-based waits, value extraction, and failure
//! re-raising.
//!
//! # The park loop
//!
//! Every wait runs the same loop, with the branches checked in this order:
//!
//! 1. Terminal state observed - deregister and return.
//! 2. Outcome being published right now ([`Completing`]) - yield and re-check.
//! 3. Interrupt pending on the calling thread - raise or swallow, by wait mode.
//! 4. Not registered yet - register in the waiter list, then *re-check the state
//!    before parking* (registration happens-before the re-check, which is what makes
//!    the wake-before-drain ordering airtight: a completer that missed this waiter in
//!    its drain must have published the terminal state before the drain, so the
//!    re-check sees it).
//! 5. Park, with the remaining time when the wait is timed.
//!
//! The deadline's start timestamp is read exactly once per call; a zero timeout
//! returns promptly without registering or reading the clock; spurious wakes are
//! benign because the loop re-checks everything.
//!
//! [`Completing`]: crate::state::CompletionState::Completing

use super::future_core::{CompletedOutcome, Future};
use crate::{error::{Cause, FutureError, FutureResult, cause_of},
            interrupt,
            state::CompletionState,
            waiter::Waiter};
use std::{sync::Arc,
          thread,
          time::{Duration, Instant}};

/// How a blocking wait reacts to the calling thread's interrupt token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitMode {
    /// Raise [`FutureError::Interrupted`], consuming the pending flag.
    Interruptible,
    /// Keep waiting; re-assert the pending flag on return.
    Uninterruptible,
}

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Blocks until the future completes.
    ///
    /// # Errors
    ///
    /// [`FutureError::Interrupted`] when the calling thread's interrupt token trips
    /// (the pending flag is consumed); [`FutureError::TooManyWaiters`] at the waiter
    /// ceiling.
    pub fn wait_done(&self) -> FutureResult<()> {
        self.block_until_done(WaitMode::Interruptible, None)
            .map(|_completed| ())
    }

    /// Blocks until the future completes or `timeout` elapses. Returns whether the
    /// future is done; a `false` return leaves the future untouched.
    ///
    /// # Errors
    ///
    /// As for [`wait_done`].
    ///
    /// [`wait_done`]: Self::wait_done
    pub fn wait_done_timeout(&self, timeout: Duration) -> FutureResult<bool> {
        self.block_until_done(WaitMode::Interruptible, Some(timeout))
    }

    /// Blocks until the future completes, riding out interrupts. An interrupt that
    /// arrived mid-wait is re-asserted on the calling thread before returning.
    ///
    /// # Errors
    ///
    /// [`FutureError::TooManyWaiters`] at the waiter ceiling.
    pub fn wait_done_uninterruptibly(&self) -> FutureResult<()> {
        self.block_until_done(WaitMode::Uninterruptible, None)
            .map(|_completed| ())
    }

    /// Timed variant of [`wait_done_uninterruptibly`].
    ///
    /// # Errors
    ///
    /// [`FutureError::TooManyWaiters`] at the waiter ceiling.
    ///
    /// [`wait_done_uninterruptibly`]: Self::wait_done_uninterruptibly
    pub fn wait_done_timeout_uninterruptibly(&self, timeout: Duration) -> FutureResult<bool> {
        self.block_until_done(WaitMode::Uninterruptible, Some(timeout))
    }

    /// Blocks for completion, then returns the value.
    ///
    /// # Errors
    ///
    /// [`FutureError::Failed`] wrapping the cause, [`FutureError::Cancelled`],
    /// [`FutureError::Interrupted`], or [`FutureError::TooManyWaiters`].
    pub fn get(&self) -> FutureResult<T> {
        self.wait_done()?;
        self.report_outcome()
    }

    /// Timed variant of [`get`].
    ///
    /// # Errors
    ///
    /// As for [`get`], plus [`FutureError::TimedOut`] when `timeout` elapses first -
    /// which never touches the future's outcome.
    ///
    /// [`get`]: Self::get
    pub fn get_timeout(&self, timeout: Duration) -> FutureResult<T> {
        if self.block_until_done(WaitMode::Interruptible, Some(timeout))? {
            self.report_outcome()
        } else {
            Err(FutureError::TimedOut { waited: timeout })
        }
    }

    /// Blocks for completion, returning the value or re-raising the original failure
    /// cause directly (no [`FutureError`] wrapper).
    ///
    /// # Errors
    ///
    /// The future's own cause on failure or cancellation; a synthesised cause when
    /// the wait itself errored (interrupt, waiter ceiling).
    pub fn sync(&self) -> Result<T, Cause> {
        if let Err(wait_error) = self.wait_done() {
            return Err(cause_of(wait_error));
        }
        match self.completed_outcome() {
            CompletedOutcome::Success(value) => Ok(value),
            CompletedOutcome::Failure(cause) | CompletedOutcome::Cancelled(cause) => Err(cause),
        }
    }

    /// Translates a completed future's outcome into the `get` result shape.
    pub(crate) fn report_outcome(&self) -> FutureResult<T> {
        match self.completed_outcome() {
            CompletedOutcome::Success(value) => Ok(value),
            CompletedOutcome::Failure(cause) => Err(FutureError::Failed { cause }),
            CompletedOutcome::Cancelled(cause) => Err(FutureError::Cancelled { cause }),
        }
    }

    /// The park loop. Returns whether the future is done (always `true` for untimed
    /// waits that return `Ok`).
    fn block_until_done(&self, mode: WaitMode, timeout: Option<Duration>) -> FutureResult<bool> {
        // Zero-timeout fast path: no registration, no clock read.
        if timeout.is_some_and(|duration| duration.is_zero()) {
            return Ok(self.is_done());
        }
        // Start timestamp read exactly once per call.
        let deadline = timeout.map(|duration| Instant::now() + duration);

        let mut entry: Option<Arc<Waiter>> = None;
        let mut interrupt_swallowed = false;

        let result = loop {
            match self.inner.cell.state() {
                CompletionState::New => {}
                CompletionState::Completing => {
                    thread::yield_now();
                    continue;
                }
                _terminal => break Ok(true),
            }

            if interrupt::clear_pending() {
                match mode {
                    WaitMode::Interruptible => break Err(FutureError::Interrupted),
                    WaitMode::Uninterruptible => {
                        interrupt_swallowed = true;
                        continue;
                    }
                }
            }

            if entry.is_none() {
                let registration = {
                    let mut monitor = self.inner.lock_monitor();
                    monitor.waiters.register_current_thread()
                };
                match registration {
                    Ok(waiter) => {
                        entry = Some(waiter);
                        // Re-check the state before the first park (branch 4 above).
                        continue;
                    }
                    Err(overflow) => break Err(overflow),
                }
            }

            match deadline {
                Some(deadline) => {
                    match deadline.checked_duration_since(Instant::now()) {
                        Some(remaining) if !remaining.is_zero() => {
                            thread::park_timeout(remaining);
                        }
                        _deadline_reached => break Ok(false),
                    }
                }
                None => thread::park(),
            }
        };

        if let Some(waiter) = entry {
            let mut monitor = self.inner.lock_monitor();
            monitor.waiters.deregister(&waiter);
        }
        if interrupt_swallowed {
            interrupt::set_pending();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::cause_from_message;
    use pretty_assertions::assert_eq;

    #[test]
    fn get_returns_value_after_completion_on_another_thread() {
        let future = Future::<i32>::new();
        let producer = {
            let future = future.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                future.try_succeed(41);
            })
        };
        assert_eq!(future.get().unwrap(), 41);
        producer.join().unwrap();
    }

    #[test]
    fn timed_wait_misses_then_hits() {
        let future = Future::<i32>::new();

        // Miss: deadline elapses, the future is untouched.
        let done = future.wait_done_timeout(Duration::from_millis(10)).unwrap();
        assert!(!done);
        assert!(!future.is_done());
        assert!(!future.is_cancelled());

        // Hit: completes, the timed get returns promptly.
        future.try_succeed(7);
        assert_eq!(future.get_timeout(Duration::from_secs(1)).unwrap(), 7);
    }

    #[test]
    fn zero_timeout_returns_promptly() {
        let future = Future::<i32>::new();
        assert!(!future.wait_done_timeout(Duration::ZERO).unwrap());
        future.try_succeed(1);
        assert!(future.wait_done_timeout(Duration::ZERO).unwrap());
    }

    #[test]
    fn get_timeout_reports_timed_out() {
        let future = Future::<i32>::new();
        let error = future.get_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(error, FutureError::TimedOut { .. }));
    }

    #[test]
    fn get_wraps_failure_and_sync_reraises_it() {
        let future: Future<i32> = Future::new();
        future.try_fail(cause_from_message("boom"));

        let get_error = future.get().unwrap_err();
        match get_error {
            FutureError::Failed { cause } => assert!(cause.to_string().contains("boom")),
            other => panic!("expected Failed, got {other:?}"),
        }

        let sync_cause = future.sync().unwrap_err();
        assert!(sync_cause.to_string().contains("boom"));
        // Same shared instance, not a copy.
        assert!(Arc::ptr_eq(&sync_cause, &future.get_cause().unwrap()));
    }

    #[test]
    fn get_reports_cancellation() {
        let future: Future<i32> = Future::new();
        future.cancel(false);
        assert!(matches!(
            future.get().unwrap_err(),
            FutureError::Cancelled { .. }
        ));
    }

    #[test]
    fn interruptible_wait_raises_and_consumes_the_flag() {
        let future = Future::<i32>::new();
        let (tx, rx) = std::sync::mpsc::channel();
        let waiter = {
            let future = future.clone();
            thread::spawn(move || {
                tx.send(interrupt::current_handle()).unwrap();
                let result = future.wait_done();
                (result, interrupt::is_pending())
            })
        };

        let handle = rx.recv().unwrap();
        thread::sleep(Duration::from_millis(20));
        handle.interrupt();

        let (result, still_pending) = waiter.join().unwrap();
        assert!(matches!(result, Err(FutureError::Interrupted)));
        assert!(!still_pending, "raising the interrupt must consume the flag");
        assert!(!future.is_done());
    }

    #[test]
    fn uninterruptible_wait_swallows_and_reasserts() {
        let future = Future::<i32>::new();
        let (tx, rx) = std::sync::mpsc::channel();
        let waiter = {
            let future = future.clone();
            thread::spawn(move || {
                tx.send(interrupt::current_handle()).unwrap();
                let result = future.wait_done_uninterruptibly();
                (result, interrupt::clear_pending())
            })
        };

        let handle = rx.recv().unwrap();
        thread::sleep(Duration::from_millis(20));
        handle.interrupt();
        thread::sleep(Duration::from_millis(20));
        future.try_succeed(9);

        let (result, was_reasserted) = waiter.join().unwrap();
        assert!(result.is_ok());
        assert!(was_reasserted, "swallowed interrupt must be re-asserted on return");
    }

    /// All waiters parked before the terminal transition are unparked (universal
    /// invariant: finite-time wakeup).
    #[test]
    fn many_waiters_all_wake() {
        const WAITER_COUNT: usize = 8;
        let future = Future::<i32>::new();

        let waiters: Vec<_> = (0..WAITER_COUNT)
            .map(|_| {
                let future = future.clone();
                thread::spawn(move || future.get().unwrap())
            })
            .collect();

        thread::sleep(Duration::from_millis(30));
        future.try_succeed(11);

        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), 11);
        }
    }
}

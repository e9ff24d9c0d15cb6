// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Deadline enforcement: [`Future::timeout`].

use super::propagate_cancellation;
use crate::{error::{TimeoutElapsedError, cause_of},
            executor::Scheduler,
            future::Future};
use std::time::Duration;

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A future that adopts this one's outcome, unless `duration` elapses first - in
    /// which case the output fails with [`TimeoutElapsedError`] and this future (the
    /// delegate) is cancelled with interrupt delivery.
    ///
    /// If the delegate completes in time, the pending timer is cancelled. Unlike a
    /// timed `get`, this operator *does* touch the delegate's outcome on expiry.
    ///
    /// A scheduler that rejects the timer submission is logged; the output then
    /// simply mirrors the delegate with no deadline armed.
    pub fn timeout(&self, duration: Duration, scheduler: &dyn Scheduler) -> Future<T> {
        let output = Future::with_executor_opt(self.inner.executor.clone());

        let scheduled = {
            let output = output.clone();
            let delegate = self.clone();
            scheduler.schedule(
                duration,
                Box::new(move || {
                    let elapsed = cause_of(TimeoutElapsedError { duration });
                    if output.try_fail(elapsed) {
                        delegate.cancel(true);
                    }
                }),
            )
        };

        // The delegate's completion listener fires exactly once, so it both mirrors
        // the outcome and disarms the timer.
        let timer_handle = match scheduled {
            Ok(handle) => Some(handle),
            Err(rejected) => {
                tracing::warn!(
                    reason = rejected.reason,
                    "timeout timer rejected; mirroring without a deadline"
                );
                None
            }
        };
        {
            let output = output.clone();
            self.add_listener(move |completed| {
                if let Some(handle) = timer_handle {
                    handle.cancel();
                }
                super::mirror_into(&completed.completed_outcome(), &output);
            });
        }

        propagate_cancellation(&output, self);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::cause_from_message, executor::TimerScheduler};
    use pretty_assertions::assert_eq;
    use std::{sync::Arc, thread};

    #[test]
    fn expiry_fails_output_and_cancels_delegate() {
        let scheduler = TimerScheduler::new();
        let delegate = Future::<i32>::new();
        let output = delegate.timeout(Duration::from_millis(50), &scheduler);

        // Do nothing; within ~100 ms the deadline must have fired.
        output.wait_done_uninterruptibly().unwrap();
        assert!(output.is_failed());
        assert!(output
            .get_cause()
            .unwrap()
            .downcast_ref::<TimeoutElapsedError>()
            .is_some());
        assert!(delegate.is_cancelled());
        scheduler.shutdown();
    }

    #[test]
    fn delegate_completion_beats_the_deadline() {
        let scheduler = TimerScheduler::new();
        let delegate = Future::<i32>::new();
        let output = delegate.timeout(Duration::from_millis(200), &scheduler);

        delegate.try_succeed(12);
        assert_eq!(output.get().unwrap(), 12);

        // The disarmed timer must not disturb anything later.
        thread::sleep(Duration::from_millis(250));
        assert!(output.is_success());
        assert!(!delegate.is_cancelled());
        scheduler.shutdown();
    }

    #[test]
    fn delegate_failure_mirrors_through() {
        let scheduler = TimerScheduler::new();
        let delegate: Future<i32> = Future::new();
        let output = delegate.timeout(Duration::from_secs(5), &scheduler);

        let cause = cause_from_message("boom");
        delegate.try_fail(Arc::clone(&cause));
        output.wait_done_uninterruptibly().unwrap();
        assert!(Arc::ptr_eq(&output.get_cause().unwrap(), &cause));
        scheduler.shutdown();
    }

    #[test]
    fn cancelling_output_cancels_delegate() {
        let scheduler = TimerScheduler::new();
        let delegate = Future::<i32>::new();
        let output = delegate.timeout(Duration::from_secs(5), &scheduler);

        assert!(output.cancel(false));
        delegate.wait_done_uninterruptibly().unwrap();
        assert!(delegate.is_cancelled());
        scheduler.shutdown();
    }
}

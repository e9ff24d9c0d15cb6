// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Value transformation: [`Future::map`] and the [`Future::erase`] helper.

use super::propagate_cancellation;
use crate::{error::panic_cause,
            future::{Future, future_core::CompletedOutcome},
            state::PolledOutcome};
use std::panic::{AssertUnwindSafe, catch_unwind};

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A future completing with `mapper(value)` when this one succeeds.
    ///
    /// - Input failure propagates unchanged (same cause instance).
    /// - A panicking mapper fails the output with the panic payload.
    /// - Cancellation propagates both ways.
    ///
    /// Fast paths: an already-succeeded input submits a trivial "apply the mapper"
    /// work unit straight to the executor instead of arming the listener chain; an
    /// already-failed or cancelled input yields a pre-completed output sharing the
    /// same cause.
    pub fn map<U>(&self, mapper: impl FnOnce(T) -> U + Send + 'static) -> Future<U>
    where
        U: Clone + Send + Sync + 'static,
    {
        match self.observe() {
            PolledOutcome::Success(value) => {
                let output = Future::with_executor_opt(self.inner.executor.clone());
                let settle = {
                    let output = output.clone();
                    move || apply_mapper(mapper, value, &output)
                };
                if let Err(rejected) = self.executor().execute(Box::new(settle)) {
                    tracing::warn!(reason = rejected.reason, "map fast path rejected");
                    output.try_fail(crate::error::cause_from_message(format!(
                        "executor rejected mapper execution: {}",
                        rejected.reason
                    )));
                }
                return output;
            }
            PolledOutcome::Failure(cause) => {
                return Future::pre_failed(cause, self.inner.executor.clone());
            }
            PolledOutcome::Cancelled(_cause) => {
                return Future::pre_cancelled(self.inner.executor.clone());
            }
            PolledOutcome::Pending => {}
        }

        let output = Future::with_executor_opt(self.inner.executor.clone());
        {
            let output = output.clone();
            self.add_listener(move |completed| match completed.completed_outcome() {
                CompletedOutcome::Success(value) => apply_mapper(mapper, value, &output),
                CompletedOutcome::Failure(cause) => {
                    output.try_fail(cause);
                }
                CompletedOutcome::Cancelled(_cause) => {
                    output.cancel(false);
                }
            });
        }
        propagate_cancellation(&output, self);
        output
    }

    /// Drops the value: `map(|_| ())`. Homogenises futures of different types so
    /// they can be aggregated together (see [`when_all_complete`]).
    ///
    /// [`when_all_complete`]: crate::when_all_complete
    #[must_use]
    pub fn erase(&self) -> Future<()> { self.map(|_value| ()) }
}

fn apply_mapper<T, U>(
    mapper: impl FnOnce(T) -> U,
    value: T,
    output: &Future<U>,
) where
    U: Clone + Send + Sync + 'static,
{
    match catch_unwind(AssertUnwindSafe(move || mapper(value))) {
        Ok(mapped) => {
            output.try_succeed(mapped);
        }
        Err(panic_payload) => {
            output.try_fail(panic_cause(panic_payload));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::{PanickedError, cause_from_message},
                executor::DirectExecutor};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn direct_future<T: Clone + Send + Sync + 'static>() -> Future<T> {
        Future::with_executor(Arc::new(DirectExecutor))
    }

    #[test]
    fn maps_success() {
        let input = direct_future::<i32>();
        let output = input.map(|value| value + 1);
        input.try_succeed(41);
        assert_eq!(output.get_now(), Some(42));
        assert!(output.is_success());
    }

    #[test]
    fn maps_already_succeeded_input_via_fast_path() {
        let input = Future::with_executor(Arc::new(DirectExecutor));
        input.try_succeed(4);
        let output = input.map(|value: i32| value * 10);
        assert_eq!(output.get_now(), Some(40));
    }

    #[test]
    fn propagates_failure_unchanged() {
        let input: Future<i32> = direct_future();
        let output = input.map(|value| value + 1);
        let cause = cause_from_message("boom");
        input.try_fail(Arc::clone(&cause));
        assert!(Arc::ptr_eq(&output.get_cause().unwrap(), &cause));
    }

    #[test]
    fn already_failed_input_shares_the_cause() {
        let cause = cause_from_message("early");
        let input: Future<i32> = Future::failed(Arc::clone(&cause));
        let output = input.map(|value| value + 1);
        assert!(Arc::ptr_eq(&output.get_cause().unwrap(), &cause));
    }

    #[test]
    fn panicking_mapper_fails_the_output() {
        let input = direct_future::<i32>();
        let output: Future<i32> = input.map(|_value| panic!("mapper boom"));
        input.try_succeed(1);
        assert!(output.is_failed());
        assert!(output
            .get_cause()
            .unwrap()
            .downcast_ref::<PanickedError>()
            .is_some());
    }

    #[test]
    fn cancelling_output_cancels_input() {
        let input = direct_future::<i32>();
        let output = input.map(|value| value + 1);
        assert!(output.cancel(false));
        assert!(input.is_cancelled());
    }

    #[test]
    fn cancelling_input_cancels_output() {
        let input = direct_future::<i32>();
        let output = input.map(|value| value + 1);
        assert!(input.cancel(false));
        assert!(output.is_cancelled());
    }

    #[test]
    fn already_cancelled_input_yields_cancelled_output() {
        let input: Future<i32> = Future::cancelled();
        let output = input.map(|value| value + 1);
        assert!(output.is_cancelled());
    }

    #[test]
    fn erase_drops_the_value() {
        let input = direct_future::<String>();
        let output = input.erase();
        input.try_succeed("anything".to_string());
        assert_eq!(output.get_now(), Some(()));
    }

    #[test]
    fn map_chains_compose() {
        let input = direct_future::<i32>();
        let output = input.map(|v| v + 1).map(|v| v * 2).map(|v| format!("={v}"));
        input.try_succeed(20);
        assert_eq!(output.get_now(), Some("=42".to_string()));
    }

    #[test]
    fn cancel_propagates_through_a_chain() {
        let input = direct_future::<i32>();
        let output = input.map(|v| v + 1).map(|v| v * 2);
        assert!(output.cancel(false));
        assert!(input.is_cancelled());
    }
}

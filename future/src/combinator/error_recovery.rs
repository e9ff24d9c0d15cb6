// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Failure-to-success conversion: [`error_handling`], the typed [`catching`] family,
//! and the flattening [`on_error_resume`].
//!
//! All of these fire on *failure only*. Cancellation is not a recoverable condition:
//! a cancelled input mirrors into the output unchanged, without consulting the
//! recovery function. (The selector combinators also pass non-matching failures
//! through unchanged.)
//!
//! [`catching`]: crate::Future::catching
//! [`error_handling`]: crate::Future::error_handling
//! [`on_error_resume`]: crate::Future::on_error_resume

use super::{adopt_outcome_of, propagate_cancellation};
use crate::{error::{Cause, panic_cause},
            future::{Future, future_core::CompletedOutcome}};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// What a recovery function decided about a failure.
enum RecoveryDecision<T> {
    /// The failure was handled; complete the output with this value.
    Recovered(T),
    /// Not this combinator's failure; pass the cause through unchanged.
    PassThrough(Cause),
}

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Converts any failure into a success via `recover`. Success values pass
    /// through; a panicking `recover` fails the output with the new error.
    pub fn error_handling(
        &self,
        recover: impl FnOnce(Cause) -> T + Send + 'static,
    ) -> Future<T> {
        self.recover_failure(move |cause| RecoveryDecision::Recovered(recover(cause)))
    }

    /// Converts a failure into a success only when the cause itself is an `E`.
    /// Non-matching failures pass through unchanged.
    pub fn catching<E>(&self, recover: impl FnOnce(&E) -> T + Send + 'static) -> Future<T>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.recover_failure(move |cause| {
            let recovered = cause.downcast_ref::<E>().map(recover);
            match recovered {
                Some(value) => RecoveryDecision::Recovered(value),
                None => RecoveryDecision::PassThrough(cause),
            }
        })
    }

    /// Converts a failure into a success when the cause *chain* contains an `E`,
    /// offering the most specific (deepest) match to `recover`.
    pub fn catch_specific_cause<E>(
        &self,
        recover: impl FnOnce(&E) -> T + Send + 'static,
    ) -> Future<T>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.recover_failure(move |cause| {
            let recovered = cause
                .chain()
                .filter_map(|entry| entry.downcast_ref::<E>())
                .last()
                .map(recover);
            match recovered {
                Some(value) => RecoveryDecision::Recovered(value),
                None => RecoveryDecision::PassThrough(cause),
            }
        })
    }

    /// Converts a failure into a success only when the *root* cause is an `E`.
    pub fn catch_root_cause<E>(
        &self,
        recover: impl FnOnce(&E) -> T + Send + 'static,
    ) -> Future<T>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.recover_failure(move |cause| {
            let recovered = cause.root_cause().downcast_ref::<E>().map(recover);
            match recovered {
                Some(value) => RecoveryDecision::Recovered(value),
                None => RecoveryDecision::PassThrough(cause),
            }
        })
    }

    /// Like [`flat_map`], but on failure: `fallback(cause)` supplies an alternate
    /// future whose outcome becomes the output's. Success passes through;
    /// cancellation mirrors through unchanged without consulting `fallback`.
    ///
    /// [`flat_map`]: Self::flat_map
    pub fn on_error_resume(
        &self,
        fallback: impl FnOnce(Cause) -> Future<T> + Send + 'static,
    ) -> Future<T> {
        let output = Future::with_executor_opt(self.inner.executor.clone());
        {
            let output = output.clone();
            self.add_listener(move |completed| match completed.completed_outcome() {
                CompletedOutcome::Success(value) => {
                    output.try_succeed(value);
                }
                CompletedOutcome::Cancelled(_cause) => {
                    output.cancel(false);
                }
                CompletedOutcome::Failure(cause) => {
                    match catch_unwind(AssertUnwindSafe(move || fallback(cause))) {
                        Ok(alternate) => adopt_outcome_of(&alternate, &output),
                        Err(panic_payload) => {
                            output.try_fail(panic_cause(panic_payload));
                        }
                    }
                }
            });
        }
        propagate_cancellation(&output, self);
        output
    }

    /// Shared wiring for the selector-based recovery combinators.
    fn recover_failure(
        &self,
        transform: impl FnOnce(Cause) -> RecoveryDecision<T> + Send + 'static,
    ) -> Future<T> {
        let output = Future::with_executor_opt(self.inner.executor.clone());
        {
            let output = output.clone();
            self.add_listener(move |completed| match completed.completed_outcome() {
                CompletedOutcome::Success(value) => {
                    output.try_succeed(value);
                }
                CompletedOutcome::Cancelled(_cause) => {
                    output.cancel(false);
                }
                CompletedOutcome::Failure(cause) => {
                    match catch_unwind(AssertUnwindSafe(move || transform(cause))) {
                        Ok(RecoveryDecision::Recovered(value)) => {
                            output.try_succeed(value);
                        }
                        Ok(RecoveryDecision::PassThrough(cause)) => {
                            output.try_fail(cause);
                        }
                        Err(panic_payload) => {
                            output.try_fail(panic_cause(panic_payload));
                        }
                    }
                }
            });
        }
        propagate_cancellation(&output, self);
        output
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Flattening composition: [`Future::flat_map`].

use super::{adopt_outcome_of, propagate_cancellation};
use crate::{error::panic_cause,
            future::{Future, future_core::CompletedOutcome}};
use std::panic::{AssertUnwindSafe, catch_unwind};

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A future adopting the outcome of the *inner* future `mapper(value)` returns.
    ///
    /// On input success the mapper runs and the output is wired to its result,
    /// covering the three inner sub-cases (already succeeded, already
    /// failed/cancelled, still incomplete - pass-through listener plus reverse
    /// cancellation). Input failure propagates unchanged; a panicking mapper fails
    /// the output; cancellation propagates both ways, reaching through to the inner
    /// future once it exists.
    pub fn flat_map<U>(
        &self,
        mapper: impl FnOnce(T) -> Future<U> + Send + 'static,
    ) -> Future<U>
    where
        U: Clone + Send + Sync + 'static,
    {
        let output = Future::with_executor_opt(self.inner.executor.clone());
        {
            let output = output.clone();
            self.add_listener(move |completed| match completed.completed_outcome() {
                CompletedOutcome::Success(value) => {
                    match catch_unwind(AssertUnwindSafe(move || mapper(value))) {
                        Ok(inner) => adopt_outcome_of(&inner, &output),
                        Err(panic_payload) => {
                            output.try_fail(panic_cause(panic_payload));
                        }
                    }
                }
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
}

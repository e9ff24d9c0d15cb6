// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Pairwise joining: [`Future::zip`] and [`Future::zip_with`].

use super::propagate_cancellation;
use crate::{error::panic_cause,
            future::{Future, future_core::CompletedOutcome}};
use std::{panic::{AssertUnwindSafe, catch_unwind},
          sync::{Mutex, PoisonError}};

/// Rendezvous state for one `zip_with` call: both values must arrive before the
/// combiner runs, whichever input completes second triggers it.
struct ZipJoin<T, U, R> {
    slots: Mutex<ZipSlots<T, U, R>>,
}

struct ZipSlots<T, U, R> {
    left: Option<T>,
    right: Option<U>,
    combiner: Option<Box<dyn FnOnce(T, U) -> R + Send + 'static>>,
}

impl<T, U, R> ZipJoin<T, U, R> {
    /// Stores one side; returns the combiner and both values once both are present.
    #[allow(clippy::type_complexity)]
    fn arrive(
        &self,
        left: Option<T>,
        right: Option<U>,
    ) -> Option<(Box<dyn FnOnce(T, U) -> R + Send + 'static>, T, U)> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = left {
            slots.left = Some(value);
        }
        if let Some(value) = right {
            slots.right = Some(value);
        }
        if slots.left.is_some() && slots.right.is_some() {
            let combiner = slots.combiner.take()?;
            let left_value = slots.left.take()?;
            let right_value = slots.right.take()?;
            Some((combiner, left_value, right_value))
        } else {
            None
        }
    }
}

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Joins two futures into a pair: `zip_with(other, |a, b| (a, b))`.
    #[must_use]
    pub fn zip<U>(&self, other: &Future<U>) -> Future<(T, U)>
    where
        U: Clone + Send + Sync + 'static,
    {
        self.zip_with(other, |left, right| (left, right))
    }

    /// Awaits both inputs and completes with `combiner(a, b)`.
    ///
    /// The first-observed terminal non-success wins: a failing input fails the
    /// output with its cause, a cancelled input cancels the output. A panicking
    /// combiner fails the output. Cancelling the output cancels *both* inputs.
    pub fn zip_with<U, R>(
        &self,
        other: &Future<U>,
        combiner: impl FnOnce(T, U) -> R + Send + 'static,
    ) -> Future<R>
    where
        U: Clone + Send + Sync + 'static,
        R: Clone + Send + Sync + 'static,
    {
        let output = Future::with_executor_opt(self.inner.executor.clone());
        let join = std::sync::Arc::new(ZipJoin {
            slots: Mutex::new(ZipSlots {
                left: None,
                right: None,
                combiner: Some(Box::new(combiner)),
            }),
        });

        {
            let output = output.clone();
            let join = std::sync::Arc::clone(&join);
            self.add_listener(move |completed| match completed.completed_outcome() {
                CompletedOutcome::Success(value) => {
                    if let Some((combiner, left, right)) = join.arrive(Some(value), None) {
                        run_combiner(combiner, left, right, &output);
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
        {
            let output = output.clone();
            other.add_listener(move |completed| match completed.completed_outcome() {
                CompletedOutcome::Success(value) => {
                    if let Some((combiner, left, right)) = join.arrive(None, Some(value)) {
                        run_combiner(combiner, left, right, &output);
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
        propagate_cancellation(&output, other);
        output
    }
}

fn run_combiner<T, U, R>(
    combiner: Box<dyn FnOnce(T, U) -> R + Send + 'static>,
    left: T,
    right: U,
    output: &Future<R>,
) where
    R: Clone + Send + Sync + 'static,
{
    match catch_unwind(AssertUnwindSafe(move || combiner(left, right))) {
        Ok(combined) => {
            output.try_succeed(combined);
        }
        Err(panic_payload) => {
            output.try_fail(panic_cause(panic_payload));
        }
    }
}

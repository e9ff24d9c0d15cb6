// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Listener plumbing shared by the combinators.

use crate::future::{Future, future_core::CompletedOutcome};

/// Wires `output -> input` cancellation: when the output completes cancelled (by
/// whoever), the input is cancelled too.
///
/// The listener closure owns an input handle, which is what keeps combinator inputs
/// alive from their outputs (and not vice versa); once the output completes, the
/// listener is consumed and the reference drops.
pub(crate) fn propagate_cancellation<A, B>(output: &Future<A>, input: &Future<B>)
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    let input = input.clone();
    output.add_listener(move |completed| {
        if completed.is_cancelled() {
            input.cancel(false);
        }
    });
}

/// Makes `output` adopt whatever outcome `inner` ends up with, handling the three
/// inner-future sub-cases: already succeeded, already failed/cancelled, and still
/// incomplete (pass-through listener plus reverse cancel propagation).
pub(crate) fn adopt_outcome_of<T>(inner: &Future<T>, output: &Future<T>)
where
    T: Clone + Send + Sync + 'static,
{
    use crate::state::PolledOutcome;
    match inner.observe() {
        PolledOutcome::Success(value) => {
            output.try_succeed(value);
        }
        PolledOutcome::Failure(cause) => {
            output.try_fail(cause);
        }
        PolledOutcome::Cancelled(_cause) => {
            output.cancel(false);
        }
        PolledOutcome::Pending => {
            {
                let output = output.clone();
                inner.add_listener(move |completed| {
                    mirror_into(&completed.completed_outcome(), &output);
                });
            }
            propagate_cancellation(output, inner);
        }
    }
}

/// Copies a terminal outcome into `target`. Lost races are fine - first writer wins.
pub(crate) fn mirror_into<T>(outcome: &CompletedOutcome<T>, target: &Future<T>)
where
    T: Clone + Send + Sync + 'static,
{
    match outcome {
        CompletedOutcome::Success(value) => {
            target.try_succeed(value.clone());
        }
        CompletedOutcome::Failure(cause) => {
            target.try_fail(cause.clone());
        }
        CompletedOutcome::Cancelled(_cause) => {
            target.cancel(false);
        }
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Aggregation over many futures: [`when_all_complete`], [`when_all_succeed`], and
//! the [`FutureCombiner`] handle they return.

use crate::{executor::Executor,
            future::{Future, future_core::CompletedOutcome},
            task::TaskFuture};
use std::sync::{Arc,
                atomic::{AtomicUsize, Ordering}};

/// How a [`FutureCombiner`] reacts to non-success input completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CombineMode {
    /// Count every completion, whatever its outcome; fire when all inputs are done.
    AllComplete,
    /// Short-circuit: the first failure or cancellation propagates to the result
    /// immediately and cancels every other input.
    AllSucceed,
}

/// Aggregates the completion of every input future. See [`FutureCombiner`].
#[must_use]
pub fn when_all_complete<T>(inputs: impl IntoIterator<Item = Future<T>>) -> FutureCombiner<T>
where
    T: Clone + Send + Sync + 'static,
{
    FutureCombiner {
        inputs: inputs.into_iter().collect(),
        mode: CombineMode::AllComplete,
        executor: None,
    }
}

/// Like [`when_all_complete`], but short-circuits on the first failure or
/// cancellation, cancelling the remaining inputs.
#[must_use]
pub fn when_all_succeed<T>(inputs: impl IntoIterator<Item = Future<T>>) -> FutureCombiner<T>
where
    T: Clone + Send + Sync + 'static,
{
    FutureCombiner {
        inputs: inputs.into_iter().collect(),
        mode: CombineMode::AllSucceed,
        executor: None,
    }
}

/// A pending aggregation: holds the inputs and a completion counter recipe until one
/// of [`call`], [`run`], or [`combine`] wires it up and returns the result future.
///
/// Inputs of mixed value types can be homogenised first with [`Future::erase`].
///
/// - The result future's executor is the explicitly supplied one, else the first
///   input's.
/// - Cancelling the result cancels every input.
/// - An empty input set completes immediately: the combiner task is submitted right
///   away ([`call`] / [`run`]), or the result completes with `()` ([`combine`]).
///
/// [`call`]: Self::call
/// [`combine`]: Self::combine
/// [`run`]: Self::run
#[allow(missing_debug_implementations)]
#[must_use]
pub struct FutureCombiner<T> {
    inputs: Vec<Future<T>>,
    mode: CombineMode,
    executor: Option<Arc<dyn Executor>>,
}

impl<T> FutureCombiner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Overrides the executor of the result future (and of the combiner task).
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// The result future completes with `callable()`, run once the aggregation
    /// condition is met.
    pub fn call<R>(self, callable: impl FnOnce() -> R + Send + 'static) -> Future<R>
    where
        R: Clone + Send + Sync + 'static,
    {
        let executor = self
            .executor
            .or_else(|| self.inputs.first().and_then(|input| input.inner.executor.clone()));
        let task = TaskFuture::build_with_executor_opt(executor, callable);
        let result = task.as_future();

        let expected = self.inputs.len();
        if expected == 0 {
            task.submit();
            return result;
        }

        let completion_counter = Arc::new(AtomicUsize::new(0));
        let inputs = Arc::new(self.inputs);
        let mode = self.mode;

        for input in inputs.iter() {
            let task = task.clone();
            let result = result.clone();
            let completion_counter = Arc::clone(&completion_counter);
            let siblings = Arc::clone(&inputs);
            input.add_listener(move |completed| {
                if mode == CombineMode::AllSucceed {
                    match completed.completed_outcome() {
                        CompletedOutcome::Failure(cause) => {
                            if result.try_fail(cause) {
                                cancel_all(&siblings);
                            }
                            return;
                        }
                        CompletedOutcome::Cancelled(_cause) => {
                            if result.cancel(false) {
                                cancel_all(&siblings);
                            }
                            return;
                        }
                        CompletedOutcome::Success(_value) => {}
                    }
                }
                let completed_count = completion_counter.fetch_add(1, Ordering::SeqCst) + 1;
                if completed_count == expected {
                    task.submit();
                }
            });
        }

        // Cancelling the aggregate result abandons the whole fan-in.
        {
            let inputs = Arc::clone(&inputs);
            result.add_listener(move |completed| {
                if completed.is_cancelled() {
                    cancel_all(&inputs);
                }
            });
        }
        result
    }

    /// The result future completes with `()` after `action` ran.
    pub fn run(self, action: impl FnOnce() + Send + 'static) -> Future<()> {
        self.call(action)
    }

    /// The result future completes with `()` once the aggregation condition is met;
    /// no user code runs.
    pub fn combine(self) -> Future<()> { self.call(|| ()) }
}

fn cancel_all<T>(inputs: &Arc<Vec<Future<T>>>)
where
    T: Clone + Send + Sync + 'static,
{
    for input in inputs.iter() {
        input.cancel(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::cause_from_message, executor::DirectExecutor};
    use pretty_assertions::assert_eq;

    fn direct_future<T: Clone + Send + Sync + 'static>() -> Future<T> {
        Future::with_executor(Arc::new(DirectExecutor))
    }

    #[test]
    fn all_complete_fires_after_every_completion() {
        let a = direct_future::<i32>();
        let b = direct_future::<i32>();
        let result = when_all_complete([a.clone(), b.clone()]).call(|| "ready");

        a.try_succeed(1);
        assert!(!result.is_done());
        b.try_succeed(2);
        assert_eq!(result.get_now(), Some("ready"));
    }

    /// `when_all_complete` counts failures as completions too.
    #[test]
    fn all_complete_counts_failures() {
        let a = direct_future::<i32>();
        let b = direct_future::<i32>();
        let result = when_all_complete([a.clone(), b.clone()]).combine();

        a.try_fail(cause_from_message("one down"));
        b.try_succeed(2);
        assert_eq!(result.get_now(), Some(()));
    }

    #[test]
    fn all_succeed_fires_on_all_successes() {
        let a = direct_future::<i32>();
        let b = direct_future::<i32>();
        let c = direct_future::<i32>();
        let result =
            when_all_succeed([a.clone(), b.clone(), c.clone()]).call(|| "ok");

        a.try_succeed(1);
        b.try_succeed(2);
        c.try_succeed(3);
        assert_eq!(result.get_now(), Some("ok"));
    }

    /// The short-circuit scenario: one failure fails the result with the same cause
    /// and cancels every sibling.
    #[test]
    fn all_succeed_short_circuits_on_failure() {
        let a = direct_future::<i32>();
        let b = direct_future::<i32>();
        let c = direct_future::<i32>();
        let result = when_all_succeed([a.clone(), b.clone(), c.clone()]).call(|| "ok");

        let cause = cause_from_message("x");
        b.try_fail(Arc::clone(&cause));

        assert!(result.is_failed());
        assert!(Arc::ptr_eq(&result.get_cause().unwrap(), &cause));
        assert!(a.is_cancelled());
        assert!(c.is_cancelled());
    }

    #[test]
    fn all_succeed_short_circuits_on_cancellation() {
        let a = direct_future::<i32>();
        let b = direct_future::<i32>();
        let result = when_all_succeed([a.clone(), b.clone()]).call(|| "ok");

        a.cancel(false);
        assert!(result.is_cancelled());
        assert!(b.is_cancelled());
    }

    #[test]
    fn empty_input_set_completes_immediately() {
        let complete = when_all_complete(Vec::<Future<i32>>::new())
            .with_executor(Arc::new(DirectExecutor))
            .call(|| 5);
        assert_eq!(complete.get_now(), Some(5));

        let succeed = when_all_succeed(Vec::<Future<i32>>::new())
            .with_executor(Arc::new(DirectExecutor))
            .combine();
        assert_eq!(succeed.get_now(), Some(()));
    }

    #[test]
    fn cancelling_the_result_cancels_every_input() {
        let a = direct_future::<i32>();
        let b = direct_future::<i32>();
        let result = when_all_complete([a.clone(), b.clone()]).call(|| 0);

        assert!(result.cancel(false));
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
    }

    #[test]
    fn run_executes_the_action() {
        use std::sync::atomic::AtomicBool;
        let a = direct_future::<i32>();
        let ran = Arc::new(AtomicBool::new(false));
        let result = {
            let ran = Arc::clone(&ran);
            when_all_complete([a.clone()]).run(move || ran.store(true, Ordering::SeqCst))
        };

        a.try_succeed(1);
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(result.get_now(), Some(()));
    }

    #[test]
    fn erased_inputs_of_mixed_types_aggregate() {
        let numbers = direct_future::<i32>();
        let text = direct_future::<String>();
        let result =
            when_all_succeed([numbers.erase(), text.erase()]).call(|| "both");

        numbers.try_succeed(1);
        text.try_succeed("hello".to_string());
        assert_eq!(result.get_now(), Some("both"));
    }
}

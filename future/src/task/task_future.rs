// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A future that owns a user-supplied computation and runs it on an executor. See
//! [`TaskFuture`] for details.

use crate::{error::{cause_from_message, panic_cause},
            executor::Executor,
            future::Future,
            interrupt,
            state::CompletionState};
use std::{panic::{AssertUnwindSafe, catch_unwind},
          sync::{Arc, Mutex, PoisonError},
          thread};

/// The embedded computation: a value-producing callable, or an action paired with a
/// fixed result to publish after it runs.
enum TaskPayload<T> {
    Callable(Box<dyn FnOnce() -> T + Send + 'static>),
    ActionWithResult {
        action: Box<dyn FnOnce() + Send + 'static>,
        result: T,
    },
}

struct TaskShared<T> {
    future: Future<T>,
    /// Taken exactly once by the first successful [`TaskFuture::run`]; cleared on
    /// completion either way so closed-over state is released promptly.
    payload: Mutex<Option<TaskPayload<T>>>,
}

/// A thin wrapper embedding a [`Future`] and adding `run` semantics:
///
/// - The task runs **at most once**, however many threads call [`run`] and however
///   the calls race with cancellation.
/// - While running, the runner thread is recorded on the future so that
///   `cancel(true)` can deliver an interrupt to it (see [`interrupt`]).
/// - A panicking task fails the future with the panic payload as cause.
///
/// The wrapper [derefs] to its future, so the whole query/blocking/listener/
/// combinator surface is available directly on it.
///
/// [`interrupt`]: crate::interrupt
/// [`run`]: Self::run
/// [derefs]: std::ops::Deref
pub struct TaskFuture<T> {
    inner: Arc<TaskShared<T>>,
}

impl<T> TaskFuture<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wraps `callable`; its return value becomes the future's success value.
    #[must_use]
    pub fn from_callable(callable: impl FnOnce() -> T + Send + 'static) -> Self {
        Self::build(None, TaskPayload::Callable(Box::new(callable)))
    }

    /// Like [`from_callable`], delivering notifications through `executor`.
    ///
    /// [`from_callable`]: Self::from_callable
    #[must_use]
    pub fn with_executor(
        executor: Arc<dyn Executor>,
        callable: impl FnOnce() -> T + Send + 'static,
    ) -> Self {
        Self::build(Some(executor), TaskPayload::Callable(Box::new(callable)))
    }

    /// Wraps `action`; after it runs, the future succeeds with the fixed `result`.
    #[must_use]
    pub fn from_action(action: impl FnOnce() + Send + 'static, result: T) -> Self {
        Self::build(
            None,
            TaskPayload::ActionWithResult {
                action: Box::new(action),
                result,
            },
        )
    }

    pub(crate) fn build_with_executor_opt(
        executor: Option<Arc<dyn Executor>>,
        callable: impl FnOnce() -> T + Send + 'static,
    ) -> Self {
        Self::build(executor, TaskPayload::Callable(Box::new(callable)))
    }

    fn build(executor: Option<Arc<dyn Executor>>, payload: TaskPayload<T>) -> Self {
        let task = Self {
            inner: Arc::new(TaskShared {
                future: Future::with_executor_opt(executor),
                payload: Mutex::new(Some(payload)),
            }),
        };
        // Release closed-over state as soon as the future completes, whichever way -
        // a task cancelled before running would otherwise pin its captures until the
        // last handle drops.
        {
            let shared = Arc::clone(&task.inner);
            task.inner.future.add_listener(move |_completed| {
                drop(shared.payload.lock().unwrap_or_else(PoisonError::into_inner).take());
            });
        }
        task
    }

    /// The embedded future handle.
    #[must_use]
    pub fn as_future(&self) -> Future<T> { self.inner.future.clone() }

    /// Submits [`run`] to the future's executor. A rejected submission fails the
    /// future (unlike a dropped listener notification, a task that never runs would
    /// otherwise hang every consumer).
    ///
    /// [`run`]: Self::run
    pub fn submit(&self) {
        let task = self.clone();
        let submission = self
            .inner
            .future
            .executor()
            .execute(Box::new(move || task.run()));
        if let Err(rejected) = submission {
            tracing::warn!(reason = rejected.reason, "task submission rejected");
            self.inner.future.try_fail(cause_from_message(format!(
                "executor rejected task submission: {}",
                rejected.reason
            )));
        }
    }

    /// Executes the embedded task on the calling thread, if it still should run.
    ///
    /// Installs the calling thread as *runner* only while the completion race is
    /// still open; a task whose future was already completed (typically cancelled)
    /// does not execute. On return, any `cancel(true)` that raced in has finished
    /// delivering its interrupt to this thread.
    pub fn run(&self) {
        {
            let mut runner = self
                .inner
                .future
                .inner
                .runner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !self.inner.future.is_cancellable() || runner.is_some() {
                return;
            }
            *runner = Some(interrupt::current_handle());
        }

        let payload = self
            .inner
            .payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(payload) = payload {
            let outcome = catch_unwind(AssertUnwindSafe(|| match payload {
                TaskPayload::Callable(callable) => callable(),
                TaskPayload::ActionWithResult { action, result } => {
                    action();
                    result
                }
            }));
            match outcome {
                Ok(value) => {
                    self.inner.future.try_succeed(value);
                }
                Err(panic_payload) => {
                    self.inner.future.try_fail(panic_cause(panic_payload));
                }
            }
        }

        {
            let mut runner = self
                .inner
                .future
                .inner
                .runner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *runner = None;
        }

        // A cancel(true) that lost the completion race may still be mid-interrupt.
        // Wait it out so the interrupt lands on this thread (which ran the task)
        // rather than leaking into whatever runs here next. The pending flag itself
        // is left as delivered - this thread cannot tell it apart from an interrupt
        // aimed at it for other reasons.
        while self.inner.future.completion_state() == CompletionState::Interrupting {
            thread::yield_now();
        }
    }
}

impl<T> Clone for TaskFuture<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::ops::Deref for TaskFuture<T> {
    type Target = Future<T>;

    fn deref(&self) -> &Future<T> { &self.inner.future }
}

impl<T> std::fmt::Debug for TaskFuture<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskFuture")
            .field("state", &self.inner.future.completion_state())
            .finish()
    }
}

/// Wraps `callable` in a [`TaskFuture`] on `executor`, submits it, and returns the
/// future handle.
pub fn submit_callable<T>(
    executor: Arc<dyn Executor>,
    callable: impl FnOnce() -> T + Send + 'static,
) -> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    let task = TaskFuture::with_executor(executor, callable);
    task.submit();
    task.as_future()
}

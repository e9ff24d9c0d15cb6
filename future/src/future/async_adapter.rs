// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Bridges between this crate's listener-based futures and async Rust. See
//! [`FutureAwaiter`] and [`Future::from_async`] for the two directions.

use super::future_core::Future;
use crate::{error::{FutureError, FutureResult, cause_of},
            executor::TokioExecutor};
use std::{future::Future as StdFuture,
          pin::Pin,
          sync::{Arc, Mutex, PoisonError},
          task::{Context, Poll, Waker}};
use tokio::runtime::Handle;

/// Adapts a [`Future`] into a [`std::future::Future`], so async code can `.await` it.
///
/// Obtained from [`Future::as_async`]. The adapter registers (at most) one completion
/// listener that wakes the most recently recorded [`Waker`]; polling after readiness
/// keeps reporting the same terminal outcome.
#[allow(missing_debug_implementations)]
pub struct FutureAwaiter<T> {
    future: Future<T>,
    waker_slot: Arc<Mutex<Option<Waker>>>,
    listener_armed: bool,
}

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// An awaitable view of this future. `.await` resolves to the same
    /// `Result` shape [`get`] returns.
    ///
    /// [`get`]: Self::get
    #[must_use]
    pub fn as_async(&self) -> FutureAwaiter<T> {
        FutureAwaiter {
            future: self.clone(),
            waker_slot: Arc::new(Mutex::new(None)),
            listener_armed: false,
        }
    }

    /// Runs `task` on the tokio runtime behind `handle` and exposes its output as a
    /// [`Future`] (delivered through a [`TokioExecutor`] over the same handle).
    ///
    /// Cancelling the returned future aborts the spawned task.
    pub fn from_async<F>(handle: &Handle, task: F) -> Future<T>
    where
        F: StdFuture<Output = T> + Send + 'static,
    {
        let result = Future::with_executor(Arc::new(TokioExecutor::new(handle.clone())));
        let join_handle = {
            let result = result.clone();
            handle.spawn(async move {
                let value = task.await;
                result.try_succeed(value);
            })
        };
        result.add_listener(move |completed| {
            if completed.is_cancelled() {
                join_handle.abort();
            }
        });
        result
    }

    /// Like [`from_async`], for tasks that resolve to the `Result` shape produced by
    /// [`FutureAwaiter`]. The terminal outcome is mapped back faithfully: `Ok` to
    /// success, a cancellation error to cancellation, and failures to the same cause.
    /// Round-tripping a future through [`as_async`] and back preserves its terminal
    /// outcome (though not object identity).
    ///
    /// [`as_async`]: Self::as_async
    /// [`from_async`]: Self::from_async
    pub fn from_async_result<F>(handle: &Handle, task: F) -> Future<T>
    where
        F: StdFuture<Output = FutureResult<T>> + Send + 'static,
    {
        let result = Future::with_executor(Arc::new(TokioExecutor::new(handle.clone())));
        let join_handle = {
            let result = result.clone();
            handle.spawn(async move {
                match task.await {
                    Ok(value) => {
                        result.try_succeed(value);
                    }
                    Err(FutureError::Cancelled { .. }) => {
                        result.cancel(false);
                    }
                    Err(FutureError::Failed { cause }) => {
                        result.try_fail(cause);
                    }
                    Err(other) => {
                        result.try_fail(cause_of(other));
                    }
                }
            })
        };
        result.add_listener(move |completed| {
            if completed.is_cancelled() {
                join_handle.abort();
            }
        });
        result
    }
}

impl<T> StdFuture for FutureAwaiter<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = FutureResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.future.is_done() {
            return Poll::Ready(this.future.report_outcome());
        }

        *this
            .waker_slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(cx.waker().clone());

        if !this.listener_armed {
            this.listener_armed = true;
            let waker_slot = Arc::clone(&this.waker_slot);
            this.future.add_listener(move |_completed| {
                let taken = waker_slot
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(waker) = taken {
                    waker.wake();
                }
            });
        }

        // Close the race with a completion that slipped in while arming: the listener
        // may have consumed a stale waker (or none), so re-check before pending.
        if this.future.is_done() {
            return Poll::Ready(this.future.report_outcome());
        }
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::cause_from_message;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[tokio::test]
    async fn awaiting_resolves_to_the_value() {
        let future = Future::<i32>::new();
        {
            let future = future.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                future.try_succeed(21);
            });
        }
        assert_eq!(future.as_async().await.unwrap(), 21);
    }

    #[tokio::test]
    async fn awaiting_an_already_completed_future_is_immediate() {
        let future = Future::succeeded(3);
        assert_eq!(future.as_async().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn awaiting_reports_failure() {
        let future: Future<i32> = Future::failed(cause_from_message("boom"));
        let error = future.as_async().await.unwrap_err();
        assert!(matches!(error, FutureError::Failed { .. }));
    }

    #[tokio::test]
    async fn from_async_settles_from_task_output() {
        let handle = Handle::current();
        let future = Future::from_async(&handle, async { 5 + 5 });
        let value = tokio::task::spawn_blocking(move || future.get())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, 10);
    }

    #[tokio::test]
    async fn round_trip_preserves_success() {
        let handle = Handle::current();
        let original = Future::succeeded(77);
        let round_tripped = Future::from_async_result(&handle, original.as_async());
        let value = tokio::task::spawn_blocking(move || round_tripped.get())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, 77);
    }

    #[tokio::test]
    async fn round_trip_preserves_cancellation() {
        let handle = Handle::current();
        let original: Future<i32> = Future::cancelled();
        let round_tripped = Future::from_async_result(&handle, original.as_async());
        let outcome = tokio::task::spawn_blocking(move || {
            round_tripped.wait_done_uninterruptibly().unwrap();
            round_tripped.is_cancelled()
        })
        .await
        .unwrap();
        assert!(outcome);
    }
}

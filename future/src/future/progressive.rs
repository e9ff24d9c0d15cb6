// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A future decorated with progress reporting. See [`ProgressiveFuture`] for details.

use super::future_core::Future;
use crate::{error::{FutureError, FutureResult},
            executor::{Executor, execute_or_log}};
use smallvec::SmallVec;
use std::sync::{Arc, Mutex, PoisonError};

/// A progress observer: receives the future plus `(current, total)` on every accepted
/// update. [`Fn`] rather than [`FnOnce`] - progress fires many times.
pub type ProgressListenerFn<T> = Arc<dyn Fn(&ProgressiveFuture<T>, i64, i64) + Send + Sync>;

/// Progress bookkeeping, separate from the completion machinery.
struct ProgressState<T> {
    current: i64,
    total: i64,
    listeners: SmallVec<[ProgressListenerFn<T>; 2]>,
}

/// A [`Future`] that additionally reports producer-driven progress.
///
/// Progress is an orthogonal decoration: it never persists, never affects the
/// outcome, and stops (rejects updates) once the future completes. The full future
/// API is available through [`Deref`].
///
/// # Validation rules
///
/// - `total < 0` means "total unknown"; any `current >= 0` is then accepted.
/// - Otherwise `0 <= current <= total` must hold.
/// - Updates after completion are rejected.
///
/// Comparisons are plain `i64` compares with no saturation - a `total` of
/// `i64::MAX` with `current` close to it behaves like any other pair.
///
/// [`Deref`]: std::ops::Deref
pub struct ProgressiveFuture<T> {
    future: Future<T>,
    progress: Arc<Mutex<ProgressState<T>>>,
}

impl<T> ProgressiveFuture<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// An incomplete progressive future on the process-default executor.
    #[must_use]
    pub fn new() -> Self { Self::wrap(Future::new()) }

    /// An incomplete progressive future delivering through `executor`.
    #[must_use]
    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self::wrap(Future::with_executor(executor))
    }

    fn wrap(future: Future<T>) -> Self {
        Self {
            future,
            progress: Arc::new(Mutex::new(ProgressState {
                current: 0,
                total: -1,
                listeners: SmallVec::new(),
            })),
        }
    }

    /// The undecorated future handle.
    #[must_use]
    pub fn as_future(&self) -> Future<T> { self.future.clone() }

    /// Records a progress update and notifies progress listeners through the
    /// future's executor.
    ///
    /// # Errors
    ///
    /// [`FutureError::AlreadyCompleted`] after completion;
    /// [`FutureError::InvalidProgress`] when the pair violates the validation rules.
    pub fn set_progress(&self, current: i64, total: i64) -> FutureResult<()> {
        if self.future.is_done() {
            return Err(FutureError::AlreadyCompleted {
                state: self.future.completion_state(),
            });
        }
        if current < 0 || (total >= 0 && current > total) {
            return Err(FutureError::InvalidProgress { current, total });
        }

        let listeners: SmallVec<[ProgressListenerFn<T>; 2]> = {
            let mut progress = self
                .progress
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            progress.current = current;
            progress.total = total;
            progress.listeners.iter().map(Arc::clone).collect()
        };

        if !listeners.is_empty() {
            let observed = self.clone();
            execute_or_log(
                self.future.executor().as_ref(),
                Box::new(move || {
                    for listener in &listeners {
                        listener(&observed, current, total);
                    }
                }),
            );
        }
        Ok(())
    }

    /// The most recently accepted `(current, total)` pair. `total == -1` until the
    /// first update.
    #[must_use]
    pub fn progress(&self) -> (i64, i64) {
        let progress = self
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        (progress.current, progress.total)
    }

    /// Registers a progress observer. Fires once per accepted update, after
    /// registration; completion does not fire it.
    pub fn add_progress_listener(
        &self,
        listener: impl Fn(&ProgressiveFuture<T>, i64, i64) + Send + Sync + 'static,
    ) {
        self.progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .push(Arc::new(listener));
    }
}

impl<T> Clone for ProgressiveFuture<T> {
    fn clone(&self) -> Self {
        Self {
            future: self.future.clone(),
            progress: Arc::clone(&self.progress),
        }
    }
}

impl<T> std::ops::Deref for ProgressiveFuture<T> {
    type Target = Future<T>;

    fn deref(&self) -> &Future<T> { &self.future }
}

impl<T> std::fmt::Debug for ProgressiveFuture<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressiveFuture")
            .field("state", &self.future.completion_state())
            .finish()
    }
}

impl<T> Default for ProgressiveFuture<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self { Self::new() }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The error surface of the blocking accessors and producer operations. See
//! [`FutureError`] for details.

use super::Cause;
use crate::state::CompletionState;
use std::time::Duration;

/// Type alias for results produced by fallible future operations. Works hand in hand
/// with [`FutureError`].
pub type FutureResult<T> = std::result::Result<T, FutureError>;

/// Errors surfaced by the blocking accessors ([`get`], [`get_timeout`], [`wait_done`])
/// and the raising producer operations ([`set_success`] / [`set_failure`]).
///
/// | Variant              | Raised by                           | Future's outcome touched? |
/// | :------------------- | :---------------------------------- | :------------------------ |
/// | [`Failed`]           | `get*` on a failed future           | No (reports it)           |
/// | [`Cancelled`]        | `get*` on a cancelled future        | No (reports it)           |
/// | [`TimedOut`]         | timed `get` whose deadline elapsed  | No                        |
/// | [`Interrupted`]      | interruptible wait, token tripped   | No                        |
/// | [`AlreadyCompleted`] | `set_*` on a completed future       | No (programmer error)     |
/// | [`TooManyWaiters`]   | waiter-count ceiling reached        | No (programmer error)     |
/// | [`InvalidProgress`]  | out-of-range [`set_progress`] call  | No (programmer error)     |
///
/// Programmer errors surface as local `Err` returns and never flow through the
/// future's state.
///
/// [`AlreadyCompleted`]: Self::AlreadyCompleted
/// [`Cancelled`]: Self::Cancelled
/// [`Failed`]: Self::Failed
/// [`Interrupted`]: Self::Interrupted
/// [`InvalidProgress`]: Self::InvalidProgress
/// [`TimedOut`]: Self::TimedOut
/// [`TooManyWaiters`]: Self::TooManyWaiters
/// [`get`]: crate::Future::get
/// [`get_timeout`]: crate::Future::get_timeout
/// [`set_failure`]: crate::Future::set_failure
/// [`set_progress`]: crate::ProgressiveFuture::set_progress
/// [`set_success`]: crate::Future::set_success
/// [`wait_done`]: crate::Future::wait_done
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic)]
pub enum FutureError {
    /// The future completed with a failure; the original cause is attached unchanged.
    #[error("future failed: {cause}")]
    #[diagnostic(code(r3bl_future::failed))]
    Failed {
        /// The failure the producer published, shared by all observers.
        cause: Cause,
    },

    /// The future was cancelled before it could complete.
    #[error("future was cancelled: {cause}")]
    #[diagnostic(
        code(r3bl_future::cancelled),
        help("Test for this case with `is_cancelled()` before calling `get()`.")
    )]
    Cancelled {
        /// The lean cancellation cause (see [`CancelledError`]).
        ///
        /// [`CancelledError`]: super::CancelledError
        cause: Cause,
    },

    /// A timed blocking accessor gave up waiting. The future itself is untouched and
    /// may still complete later.
    #[error("gave up waiting for completion after {waited:?}")]
    #[diagnostic(code(r3bl_future::timed_out))]
    TimedOut {
        /// How long the caller was prepared to wait.
        waited: Duration,
    },

    /// The calling thread's interrupt token tripped during an interruptible wait. The
    /// pending flag has been cleared, mirroring how raising the condition consumes it.
    #[error("wait was interrupted")]
    #[diagnostic(
        code(r3bl_future::interrupted),
        help("Use the `wait_done_uninterruptibly` variants to ride out interrupts.")
    )]
    Interrupted,

    /// `set_success` / `set_failure` was called on a future that already has an
    /// outcome.
    #[error("future already completed as {state}")]
    #[diagnostic(
        code(r3bl_future::already_completed),
        help("Use `try_succeed` / `try_fail` when losing the completion race is expected.")
    )]
    AlreadyCompleted {
        /// The terminal state the future was found in.
        state: CompletionState,
    },

    /// The per-future ceiling on concurrently blocked threads was reached.
    #[error("too many threads waiting on one future (limit {limit})")]
    #[diagnostic(code(r3bl_future::too_many_waiters))]
    TooManyWaiters {
        /// The ceiling that was hit.
        limit: usize,
    },

    /// A progress update was out of range, or arrived after completion.
    #[error("invalid progress update: current = {current}, total = {total}")]
    #[diagnostic(
        code(r3bl_future::invalid_progress),
        help("`current` must satisfy 0 <= current <= total; a negative total means unknown.")
    )]
    InvalidProgress {
        /// The rejected `current` value.
        current: i64,
        /// The `total` supplied alongside it.
        total: i64,
    },
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The failure payload carried by a failed future, and the marker error types the
//! library itself produces. See [`Cause`] for details.

use std::{any::Any, sync::Arc, time::Duration};

/// The dynamic failure payload of a future.
///
/// A failed future is observed by many parties - blocking callers, listeners, and every
/// combinator downstream of it - so the payload is reference counted and every observer
/// sees the *same* underlying [`miette::Report`]. This is what makes "the same throwable
/// instance propagates through combinators" hold in an ownership language.
///
/// [`miette::Report`] is used (rather than a bare `Box<dyn Error>`) because it carries
/// the full cause chain, which the selector-based recovery combinators walk:
///
/// - [`downcast_ref`] backs [`catching`]
/// - [`chain`] backs [`catch_specific_cause`]
/// - the last chain entry backs [`catch_root_cause`]
///
/// [`catch_root_cause`]: crate::Future::catch_root_cause
/// [`catch_specific_cause`]: crate::Future::catch_specific_cause
/// [`catching`]: crate::Future::catching
/// [`chain`]: miette::Report::chain
/// [`downcast_ref`]: miette::Report::downcast_ref
pub type Cause = Arc<miette::Report>;

/// Wraps a diagnostic error into a [`Cause`].
pub fn cause_of(error: impl miette::Diagnostic + Send + Sync + 'static) -> Cause {
    Arc::new(miette::Report::new(error))
}

/// Builds a [`Cause`] from a bare message, for failures that have no richer error value.
pub fn cause_from_message(message: impl Into<String>) -> Cause {
    Arc::new(miette::Report::msg(message.into()))
}

/// Converts a payload caught by [`catch_unwind`] into a [`Cause`].
///
/// User-supplied code (tasks, mappers, combiners) signals failure by panicking - the
/// Rust rendition of an unchecked throw. The payload is almost always a `&str` or
/// `String` from `panic!`; anything else is reported with a generic message.
///
/// [`catch_unwind`]: std::panic::catch_unwind
pub fn panic_cause(payload: Box<dyn Any + Send>) -> Cause {
    let message = if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "user-supplied code panicked with a non-string payload".to_string()
    };
    cause_of(PanickedError { message })
}

/// The cancellation marker carried by a cancelled future's [`Cause`].
///
/// Deliberately lean: no backtrace, no fields. Consumers that need to distinguish
/// cancellation from ordinary failure by *payload* (rather than by
/// [`is_cancelled()`]) test for this type with [`miette::Report::downcast_ref`].
///
/// Note the asymmetry the completion protocol allows: publishing a
/// `CancelledError`-typed report through [`try_fail()`] is legal and lands the future in
/// the *failed* state, not the cancelled one - only the class test can tell the two
/// apart.
///
/// [`is_cancelled()`]: crate::Future::is_cancelled
/// [`try_fail()`]: crate::Future::try_fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("future was cancelled")]
#[diagnostic(code(r3bl_future::cancelled))]
pub struct CancelledError;

/// The failure produced by the [`timeout`] operator when the delegate misses its
/// deadline.
///
/// Distinct from [`FutureError::TimedOut`]: that one is returned to a *blocking caller*
/// whose own wait elapsed (and never touches the future), whereas this one becomes the
/// terminal outcome of the operator's output future.
///
/// [`FutureError::TimedOut`]: super::FutureError::TimedOut
/// [`timeout`]: crate::Future::timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("future did not complete within {duration:?}")]
#[diagnostic(code(r3bl_future::timeout_elapsed))]
pub struct TimeoutElapsedError {
    /// The deadline the delegate missed.
    pub duration: Duration,
}

/// The failure produced when user-supplied code panics. See [`panic_cause`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("user-supplied code panicked: {message}")]
#[diagnostic(code(r3bl_future::panicked))]
pub struct PanickedError {
    /// The stringified panic payload.
    pub message: String,
}

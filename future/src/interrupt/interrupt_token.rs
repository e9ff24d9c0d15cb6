// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Per-thread interrupt tokens: a pending flag plus the thread handle needed to unpark
//! it. See [`InterruptHandle`] for details.
//!
//! Rust threads carry no ambient interrupt status, so the library supplies one with
//! the same observable semantics the blocking accessors need:
//!
//! - Any holder of a thread's [`InterruptHandle`] can [`interrupt()`] it: the pending
//!   flag is set and the thread is unparked, so a park-based wait loop wakes up and
//!   notices.
//! - The interrupted thread consumes the condition with [`clear_pending()`] (raising
//!   it as an error clears the flag), or observes it non-destructively with
//!   [`is_pending()`].
//! - Uninterruptible waits that swallowed an interrupt re-assert it on return via
//!   [`set_pending()`].
//!
//! The flag is advisory. Nothing is delivered asynchronously - only code that polls
//! the token reacts, which is exactly what the park loops in this crate do.
//!
//! [`clear_pending()`]: clear_pending
//! [`interrupt()`]: InterruptHandle::interrupt
//! [`is_pending()`]: is_pending
//! [`set_pending()`]: set_pending

use std::{sync::{Arc,
                 atomic::{AtomicBool, Ordering}},
          thread,
          thread::Thread};

thread_local! {
    /// Each thread owns one flag for its whole lifetime; handles share it.
    static INTERRUPT_FLAG: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
}

/// A handle that can interrupt one specific thread.
///
/// Cheap to clone; typically captured by a task future when it starts running so that
/// `cancel(true)` can reach the runner thread later.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
    thread: Thread,
}

impl InterruptHandle {
    /// Sets the target thread's pending flag and unparks it.
    ///
    /// Idempotent: interrupting an already-interrupted (or already-finished) thread is
    /// harmless.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.thread.unpark();
    }

    /// Whether the target thread has an unconsumed interrupt.
    #[must_use]
    pub fn is_pending(&self) -> bool { self.flag.load(Ordering::SeqCst) }
}

/// A handle for the calling thread.
#[must_use]
pub fn current_handle() -> InterruptHandle {
    InterruptHandle {
        flag: INTERRUPT_FLAG.with(Arc::clone),
        thread: thread::current(),
    }
}

/// Whether the calling thread has an unconsumed interrupt. Does not consume it.
#[must_use]
pub fn is_pending() -> bool { INTERRUPT_FLAG.with(|flag| flag.load(Ordering::SeqCst)) }

/// Consumes the calling thread's pending interrupt, returning whether one was set.
pub fn clear_pending() -> bool { INTERRUPT_FLAG.with(|flag| flag.swap(false, Ordering::SeqCst)) }

/// Re-asserts the calling thread's pending flag. Used by uninterruptible waits that
/// swallowed an interrupt mid-wait.
pub fn set_pending() { INTERRUPT_FLAG.with(|flag| flag.store(true, Ordering::SeqCst)); }

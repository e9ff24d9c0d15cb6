// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Listener registration and the snapshot-and-loop notification pass.
//!
//! # The notification protocol
//!
//! One thread at a time drives notification for a given future:
//!
//! 1. Under the monitor: if a pass is already running, or there is nothing to
//!    deliver, stop. Otherwise set the `notifying` flag and detach the current batch.
//! 2. Outside the monitor: invoke the batch in addition order, each listener guarded
//!    by [`catch_unwind`].
//! 3. Reacquire the monitor: if listeners arrived in the meantime, detach and loop;
//!    otherwise clear the flag and finish.
//!
//! This guarantees every listener fires exactly once, listeners added *during* a pass
//! still fire, and two passes never run concurrently for the same future. The pass
//! itself always runs on the future's executor, never on the completing thread
//! directly.
//!
//! [`catch_unwind`]: std::panic::catch_unwind

use super::future_core::Future;
use crate::{error::Cause,
            executor::execute_or_log,
            listener::ListenerFn};
use std::panic::{AssertUnwindSafe, catch_unwind};

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Registers a completion listener.
    ///
    /// The listener fires exactly once, with this future, through the future's
    /// executor - immediately (well, as soon as the executor runs it) if the future
    /// is already done. A panicking listener is logged and swallowed; it affects
    /// neither other listeners nor the future's outcome.
    pub fn add_listener(&self, listener: impl FnOnce(&Future<T>) + Send + 'static) {
        let done_at_registration = {
            let mut monitor = self.inner.lock_monitor();
            monitor.listeners.push(Box::new(listener));
            self.is_done()
        };
        if done_at_registration {
            self.schedule_notification();
        }
    }

    /// Registers a listener that also receives an owned context value.
    ///
    /// The closure-capture idiom makes this mostly redundant in Rust; it exists for
    /// call sites that thread a context through without wanting an explicit capture.
    pub fn add_listener_with_context<C>(
        &self,
        listener: impl FnOnce(&Future<T>, C) + Send + 'static,
        context: C,
    ) where
        C: Send + 'static,
    {
        self.add_listener(move |future| listener(future, context));
    }

    /// Registers a callback invoked only on successful completion, with the value.
    pub fn on_success(&self, callback: impl FnOnce(T) + Send + 'static) {
        self.add_listener(move |future| {
            if let Some(value) = future.get_now() {
                callback(value);
            }
        });
    }

    /// Registers a callback invoked only on failure (including cancellation), with
    /// the cause.
    pub fn on_failure(&self, callback: impl FnOnce(Cause) + Send + 'static) {
        self.add_listener(move |future| {
            if let Some(cause) = future.get_cause() {
                callback(cause);
            }
        });
    }

    /// Hands the notification pass to the executor, if there is anything to deliver.
    pub(crate) fn schedule_notification(&self) {
        {
            let monitor = self.inner.lock_monitor();
            if monitor.listeners.is_empty() {
                return;
            }
        }
        let future = self.clone();
        execute_or_log(
            self.executor().as_ref(),
            Box::new(move || future.run_notification_pass()),
        );
    }

    /// The snapshot-and-loop pass. See the module docs for the protocol.
    fn run_notification_pass(&self) {
        let mut batch = {
            let mut monitor = self.inner.lock_monitor();
            if monitor.notifying || monitor.listeners.is_empty() {
                return;
            }
            monitor.notifying = true;
            monitor.listeners.take_all()
        };

        loop {
            for listener in batch {
                invoke_listener_guarded(self, listener);
            }
            let mut monitor = self.inner.lock_monitor();
            if monitor.listeners.is_empty() {
                monitor.notifying = false;
                return;
            }
            batch = monitor.listeners.take_all();
        }
    }
}

/// Listener failures never surface on the future: log and move on.
fn invoke_listener_guarded<T>(future: &Future<T>, listener: ListenerFn<T>)
where
    T: Clone + Send + Sync + 'static,
{
    if catch_unwind(AssertUnwindSafe(|| listener(future))).is_err() {
        tracing::warn!("completion listener panicked; continuing with remaining listeners");
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # r3bl_future
//!
//! Listenable and settable futures for Rust: a one-shot asynchronous outcome that
//! producers complete explicitly, consumers observe by blocking, polling, or
//! registering callbacks, and combinators compose into pipelines - with cancellation
//! propagating both ways through every operator.
//!
//! This is the *thread-and-callback* flavor of future, not the `async`/`.await`
//! flavor (though [bridges] to async Rust are included). It shines where work is
//! produced and consumed by plain threads: worker pools, blocking I/O pipelines,
//! test harnesses that need deterministic completion control.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                            Future<T>                                 │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  OutcomeCell<T>         lock-free outcome: atomic state machine      │
//! │  ├── AtomicCompletionState   (New → Completing → Succeeded/Failed,   │
//! │  │                            New → Cancelled/Interrupting → ...)    │
//! │  └── slot + cached cancellation cause                                │
//! │                                                                      │
//! │  Monitor (mutex)        registry bookkeeping only - never user code  │
//! │  ├── ListenerRegistry   none → single → many, addition order kept    │
//! │  ├── notifying flag     snapshot-and-loop notification pass          │
//! │  └── WaiterList         threads parked in blocking accessors         │
//! │                                                                      │
//! │  Executor (capability)  runs listener passes and task bodies         │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the terminal transition the completing thread wakes every parked waiter and
//! hands the listener registry to the executor; every listener fires exactly once,
//! including listeners registered after completion.
//!
//! # Examples
//!
//! Completing across threads, observing through a combinator chain:
//!
//! ```
//! use r3bl_future::Future;
//!
//! let price = Future::<i32>::new();
//! let total = price.map(|p| p * 4);
//!
//! std::thread::spawn({
//!     let price = price.clone();
//!     move || price.set_success(10).unwrap()
//! });
//!
//! assert_eq!(total.get().unwrap(), 40);
//! ```
//!
//! Aggregating with short-circuit semantics:
//!
//! ```
//! use r3bl_future::{Future, when_all_succeed};
//!
//! let a = Future::succeeded(1);
//! let b = Future::succeeded(2);
//! let ready = when_all_succeed([a, b]).call(|| "all good");
//! assert_eq!(ready.get().unwrap(), "all good");
//! ```
//!
//! # Module Contents
//!
//! - **`state`**: the atomic completion state machine ([`CompletionState`]) and
//!   outcome holder ([`OutcomeCell`])
//! - **`waiter`**: bookkeeping for blocked threads ([`WaiterList`])
//! - **`listener`**: shape-switching listener storage ([`ListenerRegistry`])
//! - **`future`**: the [`Future`] handle - producer ops, blocking accessors,
//!   listeners, async bridges, [`ProgressiveFuture`]
//! - **`task`**: [`TaskFuture`] - a future that runs an embedded computation, with
//!   interrupt-on-cancel
//! - **`combinator`**: `map`, `flat_map`, error recovery, `zip`, `timeout`,
//!   `cascade_to`, [`when_all_complete`] / [`when_all_succeed`]
//! - **`executor`**: the [`Executor`] / [`Scheduler`] capabilities and the bundled
//!   implementations (direct, thread pool, timer, tokio adapters)
//! - **`interrupt`**: per-thread interrupt tokens consumed by the blocking
//!   accessors and delivered by `cancel(true)`
//! - **`error`**: [`FutureError`], the [`Cause`] payload, and the marker errors
//!
//! [bridges]: Future::as_async

// Attach sources.
pub mod combinator;
pub mod error;
pub mod executor;
pub mod future;
pub mod interrupt;
pub mod listener;
pub mod state;
pub mod task;
pub mod waiter;

// Re-export.
pub use combinator::*;
pub use error::*;
pub use executor::*;
pub use future::*;
pub use listener::*;
pub use state::*;
pub use task::*;
pub use waiter::*;

#[cfg(test)]
mod scenario_tests;

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The per-future inner state every [`Future`] handle points at. See [`SharedState`].
//!
//! [`Future`]: super::Future

use crate::{executor::Executor,
            interrupt::InterruptHandle,
            listener::ListenerRegistry,
            state::OutcomeCell,
            waiter::WaiterList};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Everything guarded by the future's monitor mutex: the listener registry, the
/// notification-pass flag, and the waiter list.
///
/// Only registry bookkeeping happens under this lock - never user code, never parking,
/// never outcome publication. Critical sections are a handful of pointer moves.
pub(crate) struct MonitorState<T> {
    pub listeners: ListenerRegistry<T>,
    /// `true` while one thread is driving the snapshot-and-loop notification pass.
    pub notifying: bool,
    pub waiters: WaiterList,
}

/// The shared inner of one future, jointly owned by every handle, listener closure,
/// and combinator wired to it.
///
/// - `cell` is the lock-free outcome holder; every read path goes straight to it.
/// - `monitor` serialises registry mutation (see [`MonitorState`]).
/// - `executor` is the capture-at-construction delivery executor; [`None`] falls back
///   to the process default at notification time.
/// - `runner` records the thread currently executing an embedded task, so that
///   `cancel(true)` can deliver an interrupt to it. Always [`None`] for plain settable
///   futures.
pub(crate) struct SharedState<T> {
    pub cell: OutcomeCell<T>,
    pub monitor: Mutex<MonitorState<T>>,
    pub executor: Option<Arc<dyn Executor>>,
    pub runner: Mutex<Option<InterruptHandle>>,
}

impl<T> SharedState<T> {
    pub fn new(executor: Option<Arc<dyn Executor>>) -> Self {
        Self {
            cell: OutcomeCell::new(),
            monitor: Mutex::new(MonitorState {
                listeners: ListenerRegistry::None,
                notifying: false,
                waiters: WaiterList::new(),
            }),
            executor,
            runner: Mutex::new(None),
        }
    }

    /// Locks the monitor, recovering from poisoning: no user code ever runs under this
    /// lock, so a poisoned monitor still holds consistent bookkeeping.
    pub fn lock_monitor(&self) -> MutexGuard<'_, MonitorState<T>> {
        self.monitor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Bookkeeping for threads blocked inside a future's waiting accessors. See
//! [`WaiterList`] for details.

use crate::error::FutureError;
use smallvec::SmallVec;
use std::{sync::Arc, thread, thread::Thread};

/// One blocked thread. The entry is created by the waiting thread right before it
/// parks and removed by the same thread when its wait ends, however it ends.
#[derive(Debug)]
pub struct Waiter {
    thread: Thread,
}

impl Waiter {
    /// Wakes the recorded thread. Unpark permits make this race-free against a waiter
    /// that registered but has not parked yet.
    pub fn unpark(&self) { self.thread.unpark(); }
}

/// The set of threads currently blocked on one future.
///
/// Guarded by the owning future's monitor; parking itself always happens *outside*
/// the lock. On the terminal transition the whole list is detached under the lock and
/// every entry is unparked outside it - each waiter's park loop then re-reads the
/// state and returns. A waiter that registers after the terminal transition observes
/// the state on its pre-park re-check and never parks at all.
///
/// Entries are `Arc`-shared between the list and the owning thread so a detached
/// entry can still be unparked after the waiter has already removed itself - the
/// stray unpark is absorbed by the next park's permit and is harmless.
#[derive(Debug, Default)]
pub struct WaiterList {
    entries: SmallVec<[Arc<Waiter>; 2]>,
}

impl WaiterList {
    /// Ceiling on concurrently blocked threads per future. Hitting it is a programmer
    /// error (a wait loop leak), reported as [`FutureError::TooManyWaiters`].
    pub const MAX_WAITERS: usize = u16::MAX as usize;

    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Registers the calling thread. The returned entry must be passed to
    /// [`deregister`] when the wait ends.
    ///
    /// # Errors
    ///
    /// [`FutureError::TooManyWaiters`] when the per-future ceiling is reached.
    ///
    /// [`deregister`]: Self::deregister
    pub fn register_current_thread(&mut self) -> Result<Arc<Waiter>, FutureError> {
        if self.entries.len() >= Self::MAX_WAITERS {
            return Err(FutureError::TooManyWaiters {
                limit: Self::MAX_WAITERS,
            });
        }
        let entry = Arc::new(Waiter {
            thread: thread::current(),
        });
        self.entries.push(Arc::clone(&entry));
        Ok(entry)
    }

    /// Removes a stale entry. A no-op if the list was already drained by the waker.
    pub fn deregister(&mut self, entry: &Arc<Waiter>) {
        self.entries.retain(|candidate| !Arc::ptr_eq(candidate, entry));
    }

    /// Detaches every entry, leaving the list empty. The caller unparks them outside
    /// the lock.
    pub fn detach_all(&mut self) -> SmallVec<[Arc<Waiter>; 2]> {
        std::mem::take(&mut self.entries)
    }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn register_then_deregister() {
        let mut list = WaiterList::new();
        let entry = list.register_current_thread().unwrap();
        assert_eq!(list.len(), 1);
        list.deregister(&entry);
        assert!(list.is_empty());
    }

    #[test]
    fn deregister_after_detach_is_harmless() {
        let mut list = WaiterList::new();
        let entry = list.register_current_thread().unwrap();
        let detached = list.detach_all();
        assert_eq!(detached.len(), 1);
        list.deregister(&entry);
        assert!(list.is_empty());
    }

    #[test]
    fn detached_entries_can_still_be_unparked() {
        let mut list = WaiterList::new();
        let _entry = list.register_current_thread().unwrap();
        for waiter in list.detach_all() {
            // Absorbed by this thread's next park permit; must not panic.
            waiter.unpark();
        }
    }
}

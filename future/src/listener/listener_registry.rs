// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Shape-switching storage for a future's completion listeners. See
//! [`ListenerRegistry`] for details.

use crate::future::Future;
use smallvec::{SmallVec, smallvec};

/// A completion listener: invoked exactly once, with the completed future, through the
/// future's executor.
///
/// [`FnOnce`] is the natural shape - exactly-once delivery means the registry hands
/// ownership of the closure to the notification pass, which consumes it.
pub type ListenerFn<T> = Box<dyn FnOnce(&Future<T>) + Send + 'static>;

/// The batch of listeners a notification pass detaches in one go.
pub type ListenerBatch<T> = SmallVec<[ListenerFn<T>; 2]>;

/// Storage for 0, 1, or many listeners.
///
/// Most futures get zero or one listener, so no container is allocated for those
/// shapes; the registry promotes itself to [`Many`] on the second addition and stays
/// there. Addition order is preserved - a notification pass invokes a detached batch
/// front to back.
///
/// All mutation happens under the owning future's monitor; this type itself is not
/// synchronised.
///
/// [`Many`]: Self::Many
pub enum ListenerRegistry<T> {
    /// No listeners registered.
    None,
    /// Exactly one listener; the common case, no container allocated.
    Single(ListenerFn<T>),
    /// Two or more listeners, in addition order.
    Many(ListenerBatch<T>),
}

impl<T> ListenerRegistry<T> {
    /// Appends a listener, promoting the shape as needed.
    pub fn push(&mut self, listener: ListenerFn<T>) {
        match std::mem::take(self) {
            Self::None => *self = Self::Single(listener),
            Self::Single(first) => *self = Self::Many(smallvec![first, listener]),
            Self::Many(mut listeners) => {
                listeners.push(listener);
                *self = Self::Many(listeners);
            }
        }
    }

    /// Detaches every registered listener, leaving the registry empty. The batch
    /// preserves addition order.
    pub fn take_all(&mut self) -> ListenerBatch<T> {
        match std::mem::take(self) {
            Self::None => SmallVec::new(),
            Self::Single(listener) => smallvec![listener],
            Self::Many(listeners) => listeners,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { matches!(self, Self::None) }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Single(_) => 1,
            Self::Many(listeners) => listeners.len(),
        }
    }
}

/// Manual impl: the derive would demand `T: Default`, which the registry never
/// needs (it stores closures over `T`, not `T` itself).
impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self { Self::None }
}

impl<T> std::fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

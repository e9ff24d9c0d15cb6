// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Lock-free holder of a future's outcome: an atomic state machine plus the slot the
//! winning producer publishes through. See [`OutcomeCell`] for details.

use super::{AtomicCompletionState, CompletionState};
use crate::error::{CancelledError, Cause, cause_of};
use std::{cell::UnsafeCell, sync::OnceLock, thread};

/// The value or failure a producer settled a future with.
///
/// The cancellation family is *not* represented here - cancellation never writes the
/// slot. Its cause is materialised lazily (see [`OutcomeCell::cancellation_cause`]).
#[derive(Debug)]
pub enum SettledOutcome<T> {
    /// Completed with a value.
    Succeeded(T),
    /// Completed with a failure cause.
    Failed(Cause),
}

/// A non-blocking observation of a future's outcome.
///
/// Success values are cloned out of the cell; failure causes are shared
/// reference-counted reports, so every observer sees the same instance.
#[derive(Debug)]
pub enum PolledOutcome<T> {
    /// Not completed yet.
    Pending,
    /// Completed with a value.
    Success(T),
    /// Completed with a failure.
    Failure(Cause),
    /// Cancelled; carries the lazily materialised [`CancelledError`] cause.
    Cancelled(Cause),
}

/// Atomic outcome holder: `state` gates access to `slot`.
///
/// # Publication protocol
///
/// `slot` is written at most once, by the single thread that won the
/// `New -> Completing` transition, and is published by the release store of the final
/// state ([`Succeeded`] or [`Failed`]). Readers access the slot only after an acquire
/// load observes one of those two states, which happens-after the write. After
/// publication the slot is never mutated again, so shared `&` reads are race-free.
///
/// Cancellation bypasses the slot entirely (`New -> Cancelled` or
/// `New -> Interrupting -> Interrupted`); its cause is materialised on first request
/// into `cancel_cause` so that every reader gets the same lean [`CancelledError`]
/// report.
///
/// [`Failed`]: CompletionState::Failed
/// [`Succeeded`]: CompletionState::Succeeded
#[derive(Debug)]
pub struct OutcomeCell<T> {
    state: AtomicCompletionState,
    slot: UnsafeCell<Option<SettledOutcome<T>>>,
    cancel_cause: OnceLock<Cause>,
}

/// Safety: the publication protocol above serialises all slot access - one writer
/// before the release store, immutable shared reads after the acquire load. `T: Sync`
/// is required because completed cells hand out `&T` to concurrent readers (to clone
/// from), and `T: Send` because the value crosses from the producer's thread.
unsafe impl<T: Send + Sync> Sync for OutcomeCell<T> {}

impl<T> OutcomeCell<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicCompletionState::new(),
            slot: UnsafeCell::new(None),
            cancel_cause: OnceLock::new(),
        }
    }

    /// Reads the current state (acquire).
    #[must_use]
    pub fn state(&self) -> CompletionState { self.state.load() }

    /// Attempts to settle the cell with a value or failure. Returns `true` iff this
    /// caller won the completion race.
    pub fn try_settle(&self, outcome: SettledOutcome<T>) -> bool {
        if !self
            .state
            .try_transition(CompletionState::New, CompletionState::Completing)
        {
            return false;
        }
        let final_state = match &outcome {
            SettledOutcome::Succeeded(_) => CompletionState::Succeeded,
            SettledOutcome::Failed(_) => CompletionState::Failed,
        };
        // Safety: sole writer - this thread won New -> Completing and no reader
        // touches the slot until the release store below publishes a readable state.
        unsafe {
            *self.slot.get() = Some(outcome);
        }
        self.state.publish(final_state);
        true
    }

    /// Attempts to move the cell onto the cancellation path. Returns `true` iff this
    /// caller won the completion race.
    ///
    /// With `interrupting == true` the cell lands in [`Interrupting`]; the caller must
    /// deliver the interrupt and then call [`finish_interrupt`]. Otherwise the cell
    /// goes straight to [`Cancelled`].
    ///
    /// [`Cancelled`]: CompletionState::Cancelled
    /// [`Interrupting`]: CompletionState::Interrupting
    /// [`finish_interrupt`]: Self::finish_interrupt
    pub fn try_mark_cancelled(&self, interrupting: bool) -> bool {
        let target = if interrupting {
            CompletionState::Interrupting
        } else {
            CompletionState::Cancelled
        };
        self.state.try_transition(CompletionState::New, target)
    }

    /// Lands [`Interrupting`] in [`Interrupted`] after the interrupt was delivered.
    ///
    /// [`Interrupted`]: CompletionState::Interrupted
    /// [`Interrupting`]: CompletionState::Interrupting
    pub fn finish_interrupt(&self) {
        debug_assert!(self.state.load() == CompletionState::Interrupting);
        self.state.publish(CompletionState::Interrupted);
    }

    /// The cancellation cause, materialised once and shared by all readers.
    #[must_use]
    pub fn cancellation_cause(&self) -> Cause {
        self.cancel_cause
            .get_or_init(|| cause_of(CancelledError))
            .clone()
    }

    /// Loads the state, yielding past the transient [`Completing`] window so that a
    /// done-looking state always has a readable outcome behind it.
    ///
    /// [`Completing`]: CompletionState::Completing
    fn settled_state(&self) -> CompletionState {
        let mut state = self.state.load();
        while state == CompletionState::Completing {
            thread::yield_now();
            state = self.state.load();
        }
        state
    }
}

impl<T: Clone> OutcomeCell<T> {
    /// Observes the outcome without blocking (beyond the bounded [`Completing`] spin).
    ///
    /// [`Completing`]: CompletionState::Completing
    #[must_use]
    pub fn observe(&self) -> PolledOutcome<T> {
        match self.settled_state() {
            CompletionState::New => PolledOutcome::Pending,
            CompletionState::Succeeded => {
                // Safety: acquire-observed Succeeded; the slot was published by the
                // matching release store and is immutable from here on.
                match unsafe { &*self.slot.get() } {
                    Some(SettledOutcome::Succeeded(value)) => {
                        PolledOutcome::Success(value.clone())
                    }
                    _ => PolledOutcome::Pending,
                }
            }
            CompletionState::Failed => {
                // Safety: as above, for the Failed publication.
                match unsafe { &*self.slot.get() } {
                    Some(SettledOutcome::Failed(cause)) => PolledOutcome::Failure(cause.clone()),
                    _ => PolledOutcome::Pending,
                }
            }
            CompletionState::Cancelled
            | CompletionState::Interrupting
            | CompletionState::Interrupted => {
                PolledOutcome::Cancelled(self.cancellation_cause())
            }
            // settled_state() never returns Completing.
            CompletionState::Completing => PolledOutcome::Pending,
        }
    }

    /// The success value, if the cell settled successfully.
    #[must_use]
    pub fn success_value(&self) -> Option<T> {
        match self.observe() {
            PolledOutcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The failure cause: the published report for [`Failed`], the materialised
    /// [`CancelledError`] for the cancellation family, [`None`] otherwise.
    ///
    /// [`Failed`]: CompletionState::Failed
    #[must_use]
    pub fn failure_cause(&self) -> Option<Cause> {
        match self.observe() {
            PolledOutcome::Failure(cause) | PolledOutcome::Cancelled(cause) => Some(cause),
            _ => None,
        }
    }
}

impl<T> Default for OutcomeCell<T> {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::cause_from_message;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn settles_with_value_once() {
        let cell = OutcomeCell::new();
        assert!(cell.try_settle(SettledOutcome::Succeeded(7)));
        assert!(!cell.try_settle(SettledOutcome::Succeeded(8)));
        assert_eq!(cell.state(), CompletionState::Succeeded);
        assert_eq!(cell.success_value(), Some(7));
        assert!(cell.failure_cause().is_none());
    }

    #[test]
    fn settles_with_failure() {
        let cell: OutcomeCell<i32> = OutcomeCell::new();
        assert!(cell.try_settle(SettledOutcome::Failed(cause_from_message("boom"))));
        assert_eq!(cell.state(), CompletionState::Failed);
        assert!(cell.success_value().is_none());
        let cause = cell.failure_cause().unwrap();
        assert!(cause.to_string().contains("boom"));
    }

    #[test]
    fn cancel_blocks_later_settle() {
        let cell: OutcomeCell<i32> = OutcomeCell::new();
        assert!(cell.try_mark_cancelled(false));
        assert!(!cell.try_settle(SettledOutcome::Succeeded(1)));
        assert_eq!(cell.state(), CompletionState::Cancelled);
    }

    /// Every reader must see the *same* materialised cancellation cause.
    #[test]
    fn cancellation_cause_is_cached() {
        let cell: OutcomeCell<i32> = OutcomeCell::new();
        assert!(cell.try_mark_cancelled(false));
        let first = cell.failure_cause().unwrap();
        let second = cell.failure_cause().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.downcast_ref::<CancelledError>().is_some());
    }

    #[test]
    fn interrupt_path_reaches_terminal_state() {
        let cell: OutcomeCell<i32> = OutcomeCell::new();
        assert!(cell.try_mark_cancelled(true));
        assert_eq!(cell.state(), CompletionState::Interrupting);
        assert!(cell.state().is_cancelled());
        cell.finish_interrupt();
        assert_eq!(cell.state(), CompletionState::Interrupted);
    }

    /// Many producers race to settle; exactly one wins and its outcome sticks.
    #[test]
    fn concurrent_settle_single_winner() {
        const PRODUCER_COUNT: usize = 8;
        let cell: Arc<OutcomeCell<usize>> = Arc::new(OutcomeCell::new());

        let handles: Vec<_> = (0..PRODUCER_COUNT)
            .map(|index| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || cell.try_settle(SettledOutcome::Succeeded(index)))
            })
            .collect();

        let winner_count = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winner_count, 1);

        // The published value must be one a producer actually wrote.
        let value = cell.success_value().unwrap();
        assert!(value < PRODUCER_COUNT);
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The seven-state completion machine every future runs through exactly once. See
//! [`CompletionState`] and [`AtomicCompletionState`] for details.

use std::sync::atomic::{AtomicU8, Ordering};

/// The lifecycle states of a future's outcome.
///
/// Legal transitions, each taken at most once per future:
///
/// ```text
/// New ──► Completing ──► Succeeded
///   │              └───► Failed
///   ├───► Cancelled
///   └───► Interrupting ──► Interrupted
/// ```
///
/// - [`Completing`] is a transient marker owned by the producer that won the race: the
///   outcome slot is being written and will be published momentarily. Readers treat it
///   as "essentially done" and spin-yield until the final state lands. It is never
///   surfaced as a result.
/// - [`Interrupting`] / [`Interrupted`] are the cancellation path taken when the caller
///   asked for the running task to be interrupted; both classify as cancelled.
///
/// The discriminant values are load-bearing: `is_done` is `state != New`, and the
/// cancellation family is `state >= Cancelled`.
///
/// [`Completing`]: Self::Completing
/// [`Interrupted`]: Self::Interrupted
/// [`Interrupting`]: Self::Interrupting
#[repr(u8)]
#[derive(Debug,
         Clone,
         Copy,
         PartialEq,
         Eq,
         PartialOrd,
         Ord,
         strum_macros::Display,
         strum_macros::FromRepr)]
pub enum CompletionState {
    /// No outcome yet; producers may still win the completion race.
    New = 0,
    /// A producer won the race and is writing the outcome slot.
    Completing = 1,
    /// Terminal: completed with a value.
    Succeeded = 2,
    /// Terminal: completed with a failure cause.
    Failed = 3,
    /// Terminal: cancelled without interrupting a runner.
    Cancelled = 4,
    /// Cancelled; the interrupt is being delivered to the runner thread.
    Interrupting = 5,
    /// Terminal: cancelled, interrupt delivery finished.
    Interrupted = 6,
}

impl CompletionState {
    /// `true` once any producer has claimed the outcome (including the transient
    /// [`Completing`] window).
    ///
    /// [`Completing`]: Self::Completing
    #[must_use]
    pub fn is_done(self) -> bool { self != Self::New }

    /// `true` for the cancellation family ([`Cancelled`], [`Interrupting`],
    /// [`Interrupted`]).
    ///
    /// [`Cancelled`]: Self::Cancelled
    /// [`Interrupted`]: Self::Interrupted
    /// [`Interrupting`]: Self::Interrupting
    #[must_use]
    pub fn is_cancelled(self) -> bool { self >= Self::Cancelled }
}

/// Atomic holder of a [`CompletionState`].
///
/// All successful transitions publish with release semantics and all reads are acquire
/// loads, so a reader that observes a terminal state also observes every write the
/// completing thread performed before publishing it - in particular the outcome slot
/// (see [`OutcomeCell`]).
///
/// [`OutcomeCell`]: super::OutcomeCell
#[derive(Debug)]
pub struct AtomicCompletionState {
    bits: AtomicU8,
}

impl AtomicCompletionState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bits: AtomicU8::new(CompletionState::New as u8),
        }
    }

    /// Reads the current state (acquire).
    #[must_use]
    pub fn load(&self) -> CompletionState {
        let bits = self.bits.load(Ordering::Acquire);
        debug_assert!(CompletionState::from_repr(bits).is_some());
        CompletionState::from_repr(bits).unwrap_or(CompletionState::New)
    }

    /// Attempts the `from -> to` transition. Returns `true` iff this caller performed
    /// it; exactly one of any number of concurrent attempts from the same `from` state
    /// wins.
    #[must_use]
    pub fn try_transition(&self, from: CompletionState, to: CompletionState) -> bool {
        self.bits
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Publishes `to` unconditionally with release semantics.
    ///
    /// Only the thread that previously won a [`try_transition`] into a transient state
    /// ([`Completing`] or [`Interrupting`]) may call this to land the final state.
    ///
    /// [`Completing`]: CompletionState::Completing
    /// [`Interrupting`]: CompletionState::Interrupting
    /// [`try_transition`]: Self::try_transition
    pub fn publish(&self, to: CompletionState) { self.bits.store(to as u8, Ordering::Release); }
}

impl Default for AtomicCompletionState {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::{sync::Arc, thread};

    #[test]
    fn classification_predicates() {
        assert!(!CompletionState::New.is_done());
        assert!(CompletionState::Completing.is_done());
        assert!(CompletionState::Succeeded.is_done());
        assert!(!CompletionState::Succeeded.is_cancelled());
        assert!(!CompletionState::Failed.is_cancelled());
        assert!(CompletionState::Cancelled.is_cancelled());
        assert!(CompletionState::Interrupting.is_cancelled());
        assert!(CompletionState::Interrupted.is_cancelled());
    }

    #[test]
    fn transition_happens_once() {
        let state = AtomicCompletionState::new();
        assert!(state.try_transition(CompletionState::New, CompletionState::Completing));
        assert!(!state.try_transition(CompletionState::New, CompletionState::Cancelled));
        state.publish(CompletionState::Succeeded);
        assert_eq!(state.load(), CompletionState::Succeeded);
    }

    /// Many threads race the same `New -> Completing` transition; exactly one may win.
    #[test]
    fn concurrent_transition_has_single_winner() {
        const CONTENDER_COUNT: usize = 8;
        let state = Arc::new(AtomicCompletionState::new());

        let handles: Vec<_> = (0..CONTENDER_COUNT)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    state.try_transition(CompletionState::New, CompletionState::Completing)
                })
            })
            .collect();

        let winner_count = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winner_count, 1);
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A [`Scheduler`] backed by one dedicated timer thread and a deadline heap. See
//! [`TimerScheduler`] for details.

use super::{Executor, RejectedWorkUnit, ScheduledWorkUnitHandle, Scheduler, WorkUnit};
use std::{collections::BinaryHeap,
          panic::{AssertUnwindSafe, catch_unwind},
          sync::{Arc, Condvar, Mutex, PoisonError,
                 atomic::{AtomicBool, Ordering}},
          thread,
          time::{Duration, Instant}};

/// One pending work unit in the deadline heap.
struct ScheduledEntry {
    deadline: Instant,
    /// Tie-breaker so equal deadlines fire in submission order.
    sequence: u64,
    cancelled: Arc<AtomicBool>,
    work_unit: WorkUnit,
}

impl PartialEq for ScheduledEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Eq for ScheduledEntry {}

impl PartialOrd for ScheduledEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledEntry {
    /// [`BinaryHeap`] is a max-heap; the comparison is reversed so the *earliest*
    /// deadline (then the lowest sequence) is popped first.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

struct TimerQueue {
    heap: BinaryHeap<ScheduledEntry>,
    next_sequence: u64,
    shut_down: bool,
}

struct TimerSharedState {
    queue: Mutex<TimerQueue>,
    work_available: Condvar,
}

/// A scheduler driven by a single dedicated timer thread.
///
/// The thread sleeps on a [`Condvar`] until the earliest deadline (or a new
/// submission) and runs due work units on itself, [`catch_unwind`]-guarded. Cancelling
/// a handle flips the entry's flag; the entry is skipped when it surfaces.
///
/// Used as an [`Executor`] it runs the unit as a delay-zero entry - acceptable for the
/// light notification work the future core submits, since everything runs on the one
/// timer thread.
///
/// Dropping the last handle does not stop the thread; call [`shutdown()`] to wind it
/// down (pending entries are discarded). The process-default instance is deliberately
/// left running for the process lifetime.
///
/// [`catch_unwind`]: std::panic::catch_unwind
/// [`shutdown()`]: Self::shutdown
#[allow(missing_debug_implementations)]
#[derive(Clone)]
pub struct TimerScheduler {
    inner: Arc<TimerSharedState>,
}

impl TimerScheduler {
    /// Creates the scheduler and spawns its timer thread.
    #[must_use]
    pub fn new() -> Self {
        let inner = Arc::new(TimerSharedState {
            queue: Mutex::new(TimerQueue {
                heap: BinaryHeap::new(),
                next_sequence: 0,
                shut_down: false,
            }),
            work_available: Condvar::new(),
        });

        let thread_inner = Arc::clone(&inner);
        let spawn_result = thread::Builder::new()
            .name("r3bl-future-timer".to_string())
            .spawn(move || timer_loop(&thread_inner));
        if let Err(error) = spawn_result {
            tracing::warn!(%error, "failed to spawn timer thread");
        }

        Self { inner }
    }

    /// Stops the timer thread and discards pending entries. New submissions are
    /// rejected afterwards. Idempotent.
    pub fn shutdown(&self) {
        let mut queue = self
            .inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        queue.shut_down = true;
        queue.heap.clear();
        self.inner.work_available.notify_all();
    }
}

impl Default for TimerScheduler {
    fn default() -> Self { Self::new() }
}

impl Executor for TimerScheduler {
    fn execute(&self, work_unit: WorkUnit) -> Result<(), RejectedWorkUnit> {
        self.schedule(Duration::ZERO, work_unit).map(|_handle| ())
    }
}

impl Scheduler for TimerScheduler {
    fn schedule(
        &self,
        delay: Duration,
        work_unit: WorkUnit,
    ) -> Result<ScheduledWorkUnitHandle, RejectedWorkUnit> {
        let mut queue = self
            .inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if queue.shut_down {
            return Err(RejectedWorkUnit::with_work(
                work_unit,
                "scheduler has been shut down",
            ));
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let sequence = queue.next_sequence;
        queue.next_sequence += 1;
        queue.heap.push(ScheduledEntry {
            deadline: Instant::now() + delay,
            sequence,
            cancelled: Arc::clone(&cancelled),
            work_unit,
        });
        self.inner.work_available.notify_one();

        Ok(ScheduledWorkUnitHandle::from_cancel_fn(move || {
            cancelled.store(true, Ordering::SeqCst);
        }))
    }
}

/// What the timer thread decided to do after inspecting the heap.
enum TimerStep {
    RunDueEntry,
    WaitForWork,
    WaitUntilDeadline(Duration),
}

fn timer_loop(inner: &Arc<TimerSharedState>) {
    let mut queue = inner.queue.lock().unwrap_or_else(PoisonError::into_inner);
    loop {
        if queue.shut_down {
            queue.heap.clear();
            return;
        }

        let now = Instant::now();
        let step = match queue.heap.peek() {
            None => TimerStep::WaitForWork,
            Some(entry) if entry.deadline <= now => TimerStep::RunDueEntry,
            Some(entry) => TimerStep::WaitUntilDeadline(entry.deadline - now),
        };

        match step {
            TimerStep::RunDueEntry => {
                if let Some(entry) = queue.heap.pop() {
                    // Run outside the lock so schedule() never blocks on user code.
                    drop(queue);
                    if !entry.cancelled.load(Ordering::SeqCst)
                        && catch_unwind(AssertUnwindSafe(entry.work_unit)).is_err()
                    {
                        tracing::warn!("scheduled work unit panicked on timer thread");
                    }
                    queue = inner.queue.lock().unwrap_or_else(PoisonError::into_inner);
                }
            }
            TimerStep::WaitForWork => {
                queue = inner
                    .work_available
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            TimerStep::WaitUntilDeadline(wait_for) => {
                queue = inner
                    .work_available
                    .wait_timeout(queue, wait_for)
                    .map(|(guard, _timed_out)| guard)
                    .unwrap_or_else(|poisoned| poisoned.into_inner().0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn fires_after_delay() {
        let scheduler = TimerScheduler::new();
        let (tx, rx) = channel();
        let started = Instant::now();
        scheduler
            .schedule(
                Duration::from_millis(30),
                Box::new(move || tx.send(()).unwrap()),
            )
            .unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
        scheduler.shutdown();
    }

    #[test]
    fn cancelled_entry_does_not_fire() {
        let scheduler = TimerScheduler::new();
        let (tx, rx) = channel();
        let handle = scheduler
            .schedule(
                Duration::from_millis(30),
                Box::new(move || tx.send(()).unwrap()),
            )
            .unwrap();
        handle.cancel();
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        scheduler.shutdown();
    }

    #[test]
    fn executes_immediately_as_executor() {
        let scheduler = TimerScheduler::new();
        let (tx, rx) = channel();
        scheduler
            .execute(Box::new(move || tx.send(1).unwrap()))
            .unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
        scheduler.shutdown();
    }

    #[test]
    fn rejects_after_shutdown() {
        let scheduler = TimerScheduler::new();
        scheduler.shutdown();
        let rejected = scheduler
            .schedule(Duration::from_millis(1), Box::new(|| {}))
            .unwrap_err();
        assert!(rejected.work_unit.is_some());
    }

    #[test]
    fn equal_deadlines_fire_in_submission_order() {
        let scheduler = TimerScheduler::new();
        let (tx, rx) = channel();
        for id in 0..3 {
            let tx = tx.clone();
            scheduler
                .schedule(Duration::from_millis(20), Box::new(move || {
                    tx.send(id).unwrap();
                }))
                .unwrap();
        }
        let order: Vec<i32> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
        scheduler.shutdown();
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Outcome mirroring into an existing settable future: [`Future::cascade_to`].

use crate::future::Future;

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// One-way mirror: this future's success, failure, or cancellation is forwarded
    /// into `target`; cancellation of `target` back-propagates to this future.
    ///
    /// `target` is typically a settable future handed out to a consumer before the
    /// producing pipeline existed. If `target` was independently completed by the
    /// time the mirror fires, the forwarded outcome loses the race and is dropped.
    pub fn cascade_to(&self, target: &Future<T>) {
        {
            let target = target.clone();
            self.add_listener(move |completed| {
                super::mirror_into(&completed.completed_outcome(), &target);
            });
        }
        {
            let source = self.clone();
            target.add_listener(move |completed| {
                if completed.is_cancelled() {
                    source.cancel(false);
                }
            });
        }
    }
}

use std::collections::VecDeque;

use crate::handoff_trace;
use crate::sync::Mutex;

/// Unbounded FIFO shared between one producer thread and one consumer thread.
///
/// Both sides hold the lock only for the duration of a `VecDeque` operation,
/// so the producer never waits on consumer-side processing.
pub struct HandoffQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> HandoffQueue<T> {
    pub fn new() -> Self {
        HandoffQueue {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, item: T) {
        let mut items = self.items.lock();
        items.push_back(item);
        handoff_trace!(queued = items.len(), "handoff push");
    }

    /// Takes everything queued so far, oldest first.
    pub fn drain_all(&self) -> VecDeque<T> {
        let drained = std::mem::take(&mut *self.items.lock());
        handoff_trace!(drained = drained.len(), "handoff drain");
        drained
    }

    /// Puts items back ahead of anything pushed since they were drained.
    pub fn requeue_front(&self, undelivered: VecDeque<T>) {
        if undelivered.is_empty() {
            return;
        }
        let mut items = self.items.lock();
        handoff_trace!(
            requeued = undelivered.len(),
            queued = items.len(),
            "handoff requeue"
        );
        for item in undelivered.into_iter().rev() {
            items.push_front(item);
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for HandoffQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

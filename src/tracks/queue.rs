//! Bounded FIFO of pending tasks
//!
//! Enqueue never blocks: a full queue rejects the task. Dequeue waits for
//! a task or for cancellation. Clearing swaps in a fresh holding area under
//! the same lock that guards push and pop, so nothing can land in, or be
//! taken from, the discarded one.

use crossbeam::queue::ArrayQueue;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::error::QueueError;

pub struct TaskQueue<T> {
    capacity: usize,
    slots: Mutex<ArrayQueue<T>>,
    available: Notify,
    rejected_count: AtomicUsize,
}

impl<T> TaskQueue<T> {
    /// Create a queue holding at most `capacity` tasks
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Queue capacity must be non-zero");

        Self {
            capacity,
            slots: Mutex::new(ArrayQueue::new(capacity)),
            available: Notify::new(),
            rejected_count: AtomicUsize::new(0),
        }
    }

    /// Append a task, failing immediately with [`QueueError::Full`] at capacity
    pub fn push(&self, item: T) -> Result<(), QueueError> {
        if self.slots.lock().push(item).is_err() {
            self.rejected_count.fetch_add(1, Ordering::Relaxed);
            return Err(QueueError::Full(self.capacity));
        }
        self.available.notify_one();
        Ok(())
    }

    /// Wait for the oldest task.
    ///
    /// An already-cancelled token wins over available tasks.
    pub async fn pop(&self, cancel: &CancellationToken) -> Result<T, QueueError> {
        loop {
            if cancel.is_cancelled() {
                return Err(QueueError::Cancelled);
            }

            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(item) = self.slots.lock().pop() {
                return Ok(item);
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(QueueError::Cancelled),
                _ = &mut notified => {}
            }
        }
    }

    /// Drop every pending task, returning how many were discarded
    pub fn clean(&self) -> usize {
        let discarded = {
            let mut slots = self.slots.lock();
            std::mem::replace(&mut *slots, ArrayQueue::new(self.capacity))
        };
        discarded.len()
    }

    /// Pending task count; advisory under concurrent use
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tasks rejected because the queue was full
    pub fn rejected_count(&self) -> usize {
        self.rejected_count.load(Ordering::Relaxed)
    }
}

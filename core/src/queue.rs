//! Dynamic task queue and outstanding-work tracking
//!
//! The queue is fed by the orchestrator (seed ranges) and by the workers
//! themselves (splits and retries), so its length says nothing about whether
//! the run is finished. Completion is decided by [`WorkTracker`] instead: a
//! task is counted before it becomes visible in the channel and uncounted
//! only after every follow-up it produced was counted, so the counter never
//! reaches zero while work still exists.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, Mutex, Notify};

use crate::error::{HarvestError, HarvestResult};
use crate::range::RangeTask;

/// Atomic count of tasks created but not yet resolved
#[derive(Debug, Default)]
pub struct WorkTracker {
    outstanding: AtomicUsize,
    idle: Notify,
}

impl WorkTracker {
    /// Create a tracker with nothing outstanding
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `n` new tasks
    pub fn add(&self, n: usize) {
        self.outstanding.fetch_add(n, Ordering::SeqCst);
    }

    /// Mark one task resolved
    ///
    /// Wakes the completion waiter when this was the last outstanding task.
    ///
    /// # Panics
    ///
    /// Panics if called more often than tasks were added.
    pub fn resolve(&self) {
        let previous = self.outstanding.fetch_sub(1, Ordering::SeqCst);
        assert!(previous > 0, "resolved more tasks than were created");
        if previous == 1 {
            // notify_one stores a permit, so a waiter that has not yet
            // parked still observes the transition.
            self.idle.notify_one();
        }
    }

    /// Tasks currently outstanding
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Wait until no task is outstanding
    pub async fn wait_idle(&self) {
        loop {
            if self.outstanding() == 0 {
                return;
            }
            self.idle.notified().await;
        }
    }
}

/// Unbounded multi-producer, multi-consumer queue of range tasks
///
/// Workers share the receiver through an async mutex held only while
/// waiting for the next task.
#[derive(Debug)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<RangeTask>,
    rx: Mutex<mpsc::UnboundedReceiver<RangeTask>>,
    tracker: WorkTracker,
}

impl TaskQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            tracker: WorkTracker::new(),
        }
    }

    /// Count and enqueue one task
    pub fn push(&self, task: RangeTask) -> HarvestResult<()> {
        self.tracker.add(1);
        if self.tx.send(task).is_err() {
            self.tracker.resolve();
            return Err(HarvestError::QueueClosed);
        }
        Ok(())
    }

    /// Count and enqueue the two halves of a split range
    pub fn push_split(&self, left: RangeTask, right: RangeTask) -> HarvestResult<()> {
        self.tracker.add(2);
        if self.tx.send(left).is_err() {
            self.tracker.resolve();
            self.tracker.resolve();
            return Err(HarvestError::QueueClosed);
        }
        if self.tx.send(right).is_err() {
            self.tracker.resolve();
            return Err(HarvestError::QueueClosed);
        }
        Ok(())
    }

    /// Mark one dequeued task resolved
    ///
    /// Must be called after any follow-up tasks were pushed.
    pub fn resolve(&self) {
        self.tracker.resolve();
    }

    /// Wait for the next task; `None` once the queue is closed and empty
    pub async fn next(&self) -> Option<RangeTask> {
        self.rx.lock().await.recv().await
    }

    /// Tasks created but not yet resolved
    pub fn outstanding(&self) -> usize {
        self.tracker.outstanding()
    }

    /// Wait until every task ever pushed has been resolved
    pub async fn wait_idle(&self) {
        self.tracker.wait_idle().await
    }

    /// Close the queue and return whatever was still buffered
    ///
    /// Only valid once every worker has stopped pulling. Drained tasks stay
    /// counted as outstanding: they were never resolved.
    pub async fn close_and_drain(&self) -> Vec<RangeTask> {
        let mut rx = self.rx.lock().await;
        rx.close();
        let mut pending = Vec::new();
        while let Ok(task) = rx.try_recv() {
            pending.push(task);
        }
        pending
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

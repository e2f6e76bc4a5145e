//! Unbounded FIFO work queue with completion tracking.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

struct Inner<T> {
    items: VecDeque<T>,
    /// Tasks put but not yet acknowledged via `task_done`.
    outstanding: usize,
}

/// A task queue in the `put` / `get` / `task_done` / `join` style.
///
/// `get` blocks until an item is available, returning `None` once the queue
/// is permanently empty: no queued items and no outstanding task that could
/// still produce one. This lets a fixed pool of workers drain a
/// self-expanding workload (each directory task may enqueue subdirectory
/// tasks) and terminate without sentinel items.
pub struct WorkQueue<T> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
    done: Condvar,
}

impl<T> WorkQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                outstanding: 0,
            }),
            available: Condvar::new(),
            done: Condvar::new(),
        }
    }

    // The queue state is plain data that is valid between any two
    // operations, so a lock poisoned by a panicking worker is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue an item and increment the outstanding counter.
    pub fn put(&self, item: T) {
        let mut inner = self.lock();
        inner.items.push_back(item);
        inner.outstanding += 1;
        drop(inner);
        self.available.notify_one();
    }

    /// Dequeue the next item, blocking while the queue could still grow.
    /// Returns `None` when no items remain and no task is outstanding.
    pub fn get(&self) -> Option<T> {
        let mut inner = self.lock();
        loop {
            if let Some(item) = inner.items.pop_front() {
                return Some(item);
            }
            if inner.outstanding == 0 {
                return None;
            }
            inner = self
                .available
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Acknowledge one previously dequeued item. On the transition to zero
    /// outstanding tasks, wakes both blocked getters and joiners.
    ///
    /// # Panics
    ///
    /// Panics if called more times than `put` — a caller bug.
    pub fn task_done(&self) {
        let mut inner = self.lock();
        inner.outstanding = inner
            .outstanding
            .checked_sub(1)
            .expect("task_done called without a matching put");
        let finished = inner.outstanding == 0;
        drop(inner);
        if finished {
            self.available.notify_all();
            self.done.notify_all();
        }
    }

    /// Block until every item put has been acknowledged via `task_done`.
    pub fn join(&self) {
        let mut inner = self.lock();
        while inner.outstanding > 0 {
            inner = self.done.wait(inner).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Number of unacknowledged tasks.
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_get_returns_none_when_empty_and_idle() {
        let queue: WorkQueue<u32> = WorkQueue::new();
        assert_eq!(queue.get(), None);
    }

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::new();
        queue.put(1);
        queue.put(2);
        queue.put(3);
        assert_eq!(queue.get(), Some(1));
        assert_eq!(queue.get(), Some(2));
        assert_eq!(queue.get(), Some(3));
    }

    #[test]
    fn test_join_waits_for_task_done() {
        let queue = WorkQueue::new();
        queue.put(());
        assert_eq!(queue.outstanding(), 1);
        queue.get();
        queue.task_done();
        queue.join();
        assert_eq!(queue.outstanding(), 0);
    }

    #[test]
    fn test_workers_drain_self_expanding_workload() {
        // Each task below 6 enqueues two more; four workers must process the
        // whole binary tree of tasks and then all observe termination.
        let queue = WorkQueue::new();
        queue.put(0u32);
        let processed = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while let Some(depth) = queue.get() {
                        processed.fetch_add(1, Ordering::Relaxed);
                        if depth < 6 {
                            queue.put(depth + 1);
                            queue.put(depth + 1);
                        }
                        queue.task_done();
                    }
                });
            }
        });

        // Full binary tree of depth 6: 2^7 - 1 tasks.
        assert_eq!(processed.load(Ordering::Relaxed), 127);
        assert_eq!(queue.outstanding(), 0);
    }

    #[test]
    #[should_panic(expected = "matching put")]
    fn test_task_done_underflow_panics() {
        let queue: WorkQueue<u32> = WorkQueue::new();
        queue.task_done();
    }
}

//! Fixed-capacity message queue shared by the worker and the consumer
//!
//! When full, the *incoming* item is rejected and the queued ones are kept.
//! Control messages bypass the limit through `push_control` and do not
//! occupy a slot.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Bounded FIFO queue with a drop-newest overflow policy
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    capacity: usize,
}

struct Inner<T> {
    /// Items with a flag telling whether they count against capacity
    items: VecDeque<(T, bool)>,
    regular: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` regular items (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity + 2),
                regular: 0,
            }),
            capacity,
        }
    }

    /// Enqueue unless full; returns the item back when rejected
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let mut inner = self.inner.lock();
        if inner.regular >= self.capacity {
            return Err(item);
        }
        inner.items.push_back((item, true));
        inner.regular += 1;
        Ok(())
    }

    /// Enqueue regardless of capacity
    ///
    /// Callers bound the rate: the worker pushes two per reconnect cycle.
    pub fn push_control(&self, item: T) {
        self.inner.lock().items.push_back((item, false));
    }

    /// Dequeue the oldest item, never blocks
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        let (item, counted) = inner.items.pop_front()?;
        if counted {
            inner.regular -= 1;
        }
        Some(item)
    }

    /// All queued items, control items included
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }
}

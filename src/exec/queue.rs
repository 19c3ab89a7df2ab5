//! # Priority queue keyed by task id
//!
//! Backs the execution combinators' request pipes. Neither `crossbeam` nor
//! `tokio` ships a priority channel, so this wraps a `BinaryHeap` behind a
//! `Mutex`/`Condvar` pair — the same shape `crossbeam-queue`'s
//! `ArrayQueue` would have if it carried an ordering.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Condvar, Mutex};

struct Entry<T> {
    priority: i32,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}
impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower `priority` values are serviced first; ties broken FIFO by
        // `seq`. `BinaryHeap` is a max-heap, so both comparisons invert.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct State<T> {
    heap: BinaryHeap<Entry<T>>,
    closed: bool,
}

/// A blocking priority queue. `pop` parks the calling thread until an item
/// is available or the queue is closed and drained.
pub struct PriorityQueue<T> {
    state: Mutex<State<T>>,
    cond: Condvar,
    seq: AtomicU64,
}

impl<T> PriorityQueue<T> {
    /// A fresh, open, empty queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                heap: BinaryHeap::new(),
                closed: false,
            }),
            cond: Condvar::new(),
            seq: AtomicU64::new(0),
        }
    }

    /// Push `item` at `priority` (lower values are serviced first).
    pub fn push(&self, priority: i32, item: T) {
        let seq = self.seq.fetch_add(1, AtomicOrdering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state.heap.push(Entry { priority, seq, item });
        self.cond.notify_one();
    }

    /// Block for the next item in priority order. Returns `None` once the
    /// queue has been closed and drained.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(entry) = state.heap.pop() {
                return Some(entry.item);
            }
            if state.closed {
                return None;
            }
            state = self.cond.wait(state).unwrap();
        }
    }

    /// Mark the queue closed: queued items already pushed still drain, but
    /// `pop` returns `None` once empty and no further `push` is expected.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        self.cond.notify_all();
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_priority_order_not_push_order() {
        let q = PriorityQueue::new();
        q.push(5, "low");
        q.push(0, "high");
        q.push(5, "low-second");
        assert_eq!(q.pop(), Some("high"));
        assert_eq!(q.pop(), Some("low"));
        assert_eq!(q.pop(), Some("low-second"));
    }

    #[test]
    fn close_drains_then_returns_none() {
        let q = PriorityQueue::new();
        q.push(0, 1);
        q.close();
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn pop_blocks_until_pushed_from_another_thread() {
        use std::sync::Arc;
        let q = Arc::new(PriorityQueue::new());
        let q2 = q.clone();
        let handle = std::thread::spawn(move || q2.pop());
        std::thread::sleep(std::time::Duration::from_millis(20));
        q.push(0, 42);
        assert_eq!(handle.join().unwrap(), Some(42));
    }
}

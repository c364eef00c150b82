// crates/alnpack-core/src/queue.rs

//! Priority-ordered hand-off queue between pipeline stages.
//!
//! Stages may produce in bursts or out of order (the second-stage fan-out
//! does); the queue restores global order at every hand-off by releasing
//! only the element whose priority equals an internal counter that starts
//! at 0 and advances once per pop. Completion is signalled by producer
//! count: every producer calls [`OrderedQueue::mark_completed`] exactly
//! once, and `pop` returns `None` once no producer remains and the queue
//! has drained.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex, PoisonError};

struct Entry<T> {
    priority: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
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
        self.priority.cmp(&other.priority)
    }
}

struct Inner<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    producers: usize,
    next: u64,
}

impl<T> Inner<T> {
    #[inline]
    fn releasable(&self) -> bool {
        self.heap
            .peek()
            .is_some_and(|Reverse(e)| e.priority == self.next)
    }
}

/// Unbounded multi-producer/multi-consumer queue with strict sequential
/// delivery by priority.
pub struct OrderedQueue<T> {
    inner: Mutex<Inner<T>>,
    ready: Condvar,
}

impl<T> OrderedQueue<T> {
    /// Queue expecting `producers` calls to [`Self::mark_completed`].
    #[must_use]
    pub fn new(producers: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                producers,
                next: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// Insert `item` under `priority`. Never blocks.
    pub fn push(&self, priority: u64, item: T) {
        let mut g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let was_blocked = !g.releasable();
        g.heap.push(Reverse(Entry { priority, item }));
        if was_blocked {
            self.ready.notify_all();
        }
    }

    /// Remove and return the next element in priority order, blocking until
    /// it is available. Returns `None` once all producers have completed
    /// and the queue is empty.
    pub fn pop(&self) -> Option<(u64, T)> {
        let mut g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        while !g.releasable() && g.producers > 0 {
            g = self.ready.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
        let Reverse(entry) = g.heap.pop()?;
        g.next += 1;
        if g.releasable() {
            self.ready.notify_all();
        }
        Some((entry.priority, entry.item))
    }

    /// Signal that one producer is done. The last call releases any
    /// consumers still blocked in [`Self::pop`].
    pub fn mark_completed(&self) {
        let mut g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(g.producers > 0, "mark_completed called too often");
        g.producers = g.producers.saturating_sub(1);
        if g.producers == 0 {
            self.ready.notify_all();
        }
    }

    /// Number of elements currently queued (diagnostic only).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .heap
            .len()
    }

    /// Whether the queue currently holds no elements (diagnostic only).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn pops_in_priority_order_regardless_of_push_order() {
        let q = OrderedQueue::new(1);
        for p in [3u64, 0, 2, 1] {
            q.push(p, p * 10);
        }
        q.mark_completed();
        let mut got = Vec::new();
        while let Some((p, v)) = q.pop() {
            assert_eq!(v, p * 10);
            got.push(p);
        }
        assert_eq!(got, vec![0, 1, 2, 3]);
    }

    #[test]
    fn completion_without_elements() {
        let q: OrderedQueue<u8> = OrderedQueue::new(2);
        q.mark_completed();
        q.mark_completed();
        assert!(q.pop().is_none());
    }

    #[test]
    fn blocks_until_head_priority_arrives() {
        let q = OrderedQueue::new(1);
        q.push(1, "second");
        thread::scope(|s| {
            let h = s.spawn(|| q.pop());
            // Consumer must wait for priority 0 even though 1 is queued.
            thread::sleep(std::time::Duration::from_millis(20));
            q.push(0, "first");
            assert_eq!(h.join().unwrap(), Some((0, "first")));
        });
        assert_eq!(q.pop(), Some((1, "second")));
    }

    #[test]
    fn concurrent_producers_and_consumers_preserve_order() {
        const N: u64 = 2000;
        let q = OrderedQueue::new(4);
        let out = Mutex::new(Vec::new());
        thread::scope(|s| {
            for t in 0..4u64 {
                let q = &q;
                s.spawn(move || {
                    // Interleaved, deliberately non-monotonic push order.
                    let mut p = t;
                    while p < N {
                        q.push(N - 1 - p, N - 1 - p);
                        p += 4;
                    }
                    q.mark_completed();
                });
            }
            for _ in 0..2 {
                let (q, out) = (&q, &out);
                s.spawn(move || {
                    while let Some((p, v)) = q.pop() {
                        assert_eq!(p, v);
                        out.lock().unwrap().push(p);
                    }
                });
            }
        });
        let got = out.into_inner().unwrap();
        // Each consumer observed a subsequence, but the union is 0..N and
        // every pop advanced the shared counter in order.
        let mut sorted = got.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..N).collect::<Vec<_>>());
    }

    #[test]
    fn fan_out_completion_requires_all_producers() {
        let q: OrderedQueue<u8> = OrderedQueue::new(2);
        q.push(0, 7);
        q.mark_completed();
        assert_eq!(q.pop(), Some((0, 7)));
        // One producer still registered: a pop would block, so check state
        // from the side instead.
        assert!(q.is_empty());
        q.mark_completed();
        assert!(q.pop().is_none());
    }
}

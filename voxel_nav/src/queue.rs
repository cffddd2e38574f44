// Open-set priority queue for the A* search.
//
// A min-queue keyed by `f32` priority, built on `BinaryHeap` with reversed
// ordering. Ties are broken by a monotonic insertion sequence, so equal
// priorities come out first-in first-out and the search is deterministic.
//
// There is no decrease-key. When the search finds a cheaper route to a voxel
// that is already queued it simply enqueues the voxel again with the lower
// priority, leaving the old entry in place. Duplicate entries are harmless:
// the search checks its closed stamp after every `dequeue` and drops entries
// for voxels it has already finalized (see `pathfinding.rs`).

use crate::error::NavError;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Clone, Debug)]
struct QueueEntry<T> {
    priority: f32,
    /// Insertion order, for FIFO tiebreaking among equal priorities.
    sequence: u64,
    item: T,
}

// Rust's BinaryHeap is a max-heap, so we reverse the ordering: the smallest
// (priority, sequence) is "greatest".
impl<T> PartialEq for QueueEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for QueueEntry<T> {}

impl<T> PartialOrd for QueueEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for QueueEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Min-priority queue of search items.
#[derive(Clone, Debug)]
pub struct OpenQueue<T> {
    heap: BinaryHeap<QueueEntry<T>>,
    next_sequence: u64,
}

impl<T> Default for OpenQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_sequence: 0,
        }
    }
}

impl<T> OpenQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            next_sequence: 0,
        }
    }

    /// Insert `item` with `priority`. Re-inserting an item that is already
    /// queued adds a second entry rather than replacing the first.
    pub fn enqueue(&mut self, item: T, priority: f32) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(QueueEntry {
            priority,
            sequence,
            item,
        });
    }

    /// Remove and return the item with the smallest priority.
    pub fn dequeue(&mut self) -> Result<T, NavError> {
        self.heap
            .pop()
            .map(|entry| entry.item)
            .ok_or(NavError::EmptyQueue)
    }

    /// Priority of the next item to be dequeued.
    pub fn peek_priority(&self) -> Option<f32> {
        self.heap.peek().map(|entry| entry.priority)
    }

    /// Number of physical entries, including stale duplicates.
    pub fn count(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop all entries and restart the tiebreak sequence. Keeps the
    /// allocation for reuse by the next search.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.next_sequence = 0;
    }
}

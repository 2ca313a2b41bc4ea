//! Completion event queue.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::graph::TaskId;

/// A task finishing at `time`. Ties on time break by dispatch order.
#[derive(Clone, Copy, Debug)]
pub struct CompletionEvent {
    pub time: f64,
    pub seq: u64,
    pub task: TaskId,
    pub start: f64,
}

impl Ord for CompletionEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for CompletionEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CompletionEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CompletionEvent {}

/// Min-heap of pending completions.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<CompletionEvent>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: TaskId, start: f64, time: f64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(CompletionEvent {
            time,
            seq,
            task,
            start,
        }));
    }

    pub fn pop(&mut self) -> Option<CompletionEvent> {
        self.heap.pop().map(|Reverse(event)| event)
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(event)| event.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

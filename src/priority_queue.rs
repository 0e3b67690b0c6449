//! A fixed-capacity priority queue for ordering the children of one search
//! node. The capacity is the branching factor of a node, so a sorted buffer
//! beats a heap here.

use std::collections::VecDeque;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BoundedPriorityQueueError {
    #[error("Cannot insert into a full queue of capacity {0}")]
    CapacityExceeded(usize),
    #[error("Cannot pop from an empty queue")]
    Empty,
}

/// Entries are kept in descending priority order. Entries of equal priority
/// keep their insertion order.
#[derive(Debug, Clone)]
pub struct BoundedPriorityQueue<T> {
    entries: VecDeque<(u8, T)>,
    max_capacity: usize,
}

impl<T> BoundedPriorityQueue<T> {
    #[must_use]
    pub fn new(max_capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_capacity),
            max_capacity,
        }
    }

    /// Insert `item` behind every entry of greater or equal priority.
    ///
    /// # Errors
    ///
    /// If the queue is full. The queue is left unchanged.
    pub fn insert(&mut self, item: T, priority: u8) -> Result<(), BoundedPriorityQueueError> {
        if self.is_full() {
            return Err(BoundedPriorityQueueError::CapacityExceeded(
                self.max_capacity,
            ));
        }
        let index = self
            .entries
            .partition_point(|&(entry_priority, _)| entry_priority >= priority);
        self.entries.insert(index, (priority, item));
        Ok(())
    }

    /// Remove and return the highest priority entry.
    ///
    /// # Errors
    ///
    /// If the queue is empty.
    pub fn pop(&mut self) -> Result<T, BoundedPriorityQueueError> {
        self.entries
            .pop_front()
            .map(|(_, item)| item)
            .ok_or(BoundedPriorityQueueError::Empty)
    }

    /// Iterate over `(priority, item)` pairs from the highest priority down.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &T)> {
        self.entries.iter().map(|(priority, item)| (*priority, item))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_capacity
    }

    #[must_use]
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }
}

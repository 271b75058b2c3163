use std::collections::VecDeque;

/// Default number of records each history stack retains.
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded, chronologically ordered stack.
///
/// Pushing past capacity evicts the oldest entry. Evicted entries are gone for
/// good; this is the depth limit of the history, not an error.
#[derive(Debug, Clone)]
pub struct HistoryStack<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> HistoryStack<T> {
    /// Capacity is raised to at least one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append to the tail. Returns the evicted head entry, if any.
    pub fn push(&mut self, entry: T) -> Option<T> {
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Remove and return the most recent entry.
    pub fn pop_last(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    pub fn peek_last(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }
}

impl<T> Default for HistoryStack<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

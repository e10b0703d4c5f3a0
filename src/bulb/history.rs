//! Capacity-bounded history that evicts its oldest entry first.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct PropertyHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> PropertyHistory<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `entry`; if that exceeds capacity the oldest entry is dropped.
    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Oldest first, newest last.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_evicts_oldest_first() {
        let mut history = PropertyHistory::with_capacity(3);
        for i in 0..4 {
            history.push(i);
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(history.latest(), Some(&3));
    }

    #[test]
    fn test_below_capacity_keeps_everything() {
        let mut history = PropertyHistory::with_capacity(100);
        history.push("a");
        history.push("b");

        assert_eq!(history.len(), 2);
        assert_eq!(history.capacity(), 100);
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut history = PropertyHistory::with_capacity(0);
        history.push(1);
        assert!(history.is_empty());
        assert_eq!(history.latest(), None);
    }
}

//! Rolling buffer module for bounded sample and event history.
//!
//! A `RollingBuffer` is a fixed-capacity FIFO: pushing onto a full buffer
//! evicts the oldest entry. Entries are kept in chronological order, oldest
//! first.

use std::collections::VecDeque;

use tracing::trace;

/// Statistics about rolling buffer operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollingStats {
    /// Total number of entries pushed
    pub pushed: u64,

    /// Total number of entries evicted to stay within capacity
    pub evicted: u64,
}

/// Fixed-capacity FIFO sequence.
///
/// # Example
///
/// ```
/// use capacity_tracker::rolling::RollingBuffer;
///
/// let mut buffer = RollingBuffer::new(2);
/// buffer.push(1);
/// buffer.push(2);
/// assert_eq!(buffer.push(3), Some(1));
/// assert_eq!(buffer.to_vec(), vec![2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct RollingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
    stats: RollingStats,
}

impl<T> RollingBuffer<T> {
    /// Create an empty buffer holding at most `capacity` entries.
    ///
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            stats: RollingStats::default(),
        }
    }

    /// Append an entry, returning the evicted oldest entry if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        self.stats.pushed += 1;

        let evicted = if self.items.len() >= self.capacity {
            self.stats.evicted += 1;
            self.items.pop_front()
        } else {
            None
        };

        self.items.push_back(item);
        evicted
    }

    /// Append every entry in order. Returns how many entries were evicted.
    pub fn extend<I>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        items
            .into_iter()
            .filter_map(|item| self.push(item))
            .count()
    }

    /// Discard the current contents and keep the last `capacity` of `items`.
    pub fn replace<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let dropped = self.items.len();
        self.items.clear();
        self.stats.evicted += dropped as u64;

        let overflow = self.extend(items);
        trace!(
            dropped = dropped,
            overflow = overflow,
            len = self.items.len(),
            "Rolling buffer replaced"
        );
    }

    pub fn clear(&mut self) {
        self.stats.evicted += self.items.len() as u64;
        self.items.clear();
    }

    /// Newest entry.
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Oldest entry.
    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> &RollingStats {
        &self.stats
    }
}

impl<T: Clone> RollingBuffer<T> {
    /// Owned copy of the contents, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer: RollingBuffer<u32> = RollingBuffer::new(10);

        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 10);
        assert!(buffer.latest().is_none());
    }

    #[test]
    fn test_zero_capacity_bumped() {
        let mut buffer = RollingBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);

        buffer.push("a");
        assert_eq!(buffer.push("b"), Some("a"));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut buffer = RollingBuffer::new(3);
        for i in 0..3 {
            assert_eq!(buffer.push(i), None);
        }

        assert_eq!(buffer.push(3), Some(0));
        assert_eq!(buffer.to_vec(), vec![1, 2, 3]);
        assert_eq!(buffer.oldest(), Some(&1));
        assert_eq!(buffer.latest(), Some(&3));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut buffer = RollingBuffer::new(10);
        for i in 0..250 {
            buffer.push(i);
            assert!(buffer.len() <= 10);
        }

        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.to_vec(), (240..250).collect::<Vec<_>>());
    }

    #[test]
    fn test_extend_reports_evictions() {
        let mut buffer = RollingBuffer::new(4);
        buffer.push(0);

        let evicted = buffer.extend(1..6);
        assert_eq!(evicted, 2);
        assert_eq!(buffer.to_vec(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_replace_keeps_last_capacity() {
        let mut buffer = RollingBuffer::new(10);
        buffer.extend(100..105);

        buffer.replace(0..15);
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.to_vec(), (5..15).collect::<Vec<_>>());
    }

    #[test]
    fn test_replace_with_fewer_items() {
        let mut buffer = RollingBuffer::new(10);
        buffer.extend(0..10);

        buffer.replace(vec![42]);
        assert_eq!(buffer.to_vec(), vec![42]);
    }

    #[test]
    fn test_iter_is_chronological() {
        let mut buffer = RollingBuffer::new(3);
        buffer.extend(["a", "b", "c", "d"]);

        let forward: Vec<_> = buffer.iter().copied().collect();
        let backward: Vec<_> = buffer.iter().rev().copied().collect();
        assert_eq!(forward, vec!["b", "c", "d"]);
        assert_eq!(backward, vec!["d", "c", "b"]);
    }

    #[test]
    fn test_stats() {
        let mut buffer = RollingBuffer::new(2);
        buffer.extend(0..5);
        assert_eq!(buffer.stats().pushed, 5);
        assert_eq!(buffer.stats().evicted, 3);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.stats().evicted, 5);
    }
}

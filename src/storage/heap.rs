//! Expiration Heap
//!
//! An array-backed binary min-heap of [`ExpiryRecord`]s ordered by
//! expiration instant, soonest first. A parallel key → position map lets the
//! store re-key or remove the record of a given key in O(log n), so the heap
//! never holds more than one record per key.
//!
//! ```text
//!   records:   [ a@1s | c@3s | b@2s | d@9s ]      positions: a → 0
//!                  0      1      2      3                    c → 1
//!                                                            b → 2
//!   parent(i) = (i - 1) / 2                                  d → 3
//!   children(i) = 2i + 1, 2i + 2
//! ```
//!
//! Every swap rewrites both the `position` field of the moved records and
//! their entries in the position map.

use std::collections::HashMap;
use std::time::Instant;

/// A key together with the instant it expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryRecord {
    /// The key this record schedules for eviction
    pub key: String,
    /// When the key expires
    pub expires_at: Instant,
    /// Index of this record in the heap array. For a record handed back by
    /// `pop` or `remove`, the index it occupied when it was taken out.
    pub position: usize,
}

/// Min-heap of expiration records with per-key lookup.
#[derive(Debug, Default)]
pub struct ExpiryHeap {
    records: Vec<ExpiryRecord>,
    positions: HashMap<String, usize>,
}

impl ExpiryHeap {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in the heap.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the heap holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Schedules `key` to expire at `expires_at`.
    ///
    /// If the key already has a record, that record is moved to the new
    /// deadline instead of adding a second one.
    ///
    /// # Returns
    ///
    /// The previous deadline when an existing record was updated.
    pub fn push(&mut self, key: String, expires_at: Instant) -> Option<Instant> {
        if let Some(&position) = self.positions.get(&key) {
            let previous = std::mem::replace(&mut self.records[position].expires_at, expires_at);
            self.restore(position);
            return Some(previous);
        }

        let position = self.records.len();
        self.positions.insert(key.clone(), position);
        self.records.push(ExpiryRecord {
            key,
            expires_at,
            position,
        });
        self.sift_up(position);
        None
    }

    /// Returns the record that expires soonest without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&ExpiryRecord> {
        self.records.first()
    }

    /// Removes and returns the record that expires soonest.
    pub fn pop(&mut self) -> Option<ExpiryRecord> {
        self.remove_at(0)
    }

    /// Removes the record for `key`, if any.
    pub fn remove(&mut self, key: &str) -> Option<ExpiryRecord> {
        let position = *self.positions.get(key)?;
        self.remove_at(position)
    }

    /// Looks up the record for `key`.
    pub fn get(&self, key: &str) -> Option<&ExpiryRecord> {
        self.positions
            .get(key)
            .map(|&position| &self.records[position])
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.positions.clear();
    }

    fn remove_at(&mut self, position: usize) -> Option<ExpiryRecord> {
        if position >= self.records.len() {
            return None;
        }

        let last = self.records.len() - 1;
        self.swap(position, last);

        let mut record = self.records.pop()?;
        self.positions.remove(&record.key);
        record.position = position;

        if position < self.records.len() {
            self.restore(position);
        }

        Some(record)
    }

    /// Moves the record at `position` up or down until heap order holds.
    fn restore(&mut self, position: usize) {
        if position > 0 && self.less(position, (position - 1) / 2) {
            self.sift_up(position);
        } else {
            self.sift_down(position);
        }
    }

    fn sift_up(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / 2;
            if !self.less(position, parent) {
                break;
            }
            self.swap(position, parent);
            position = parent;
        }
    }

    fn sift_down(&mut self, mut position: usize) {
        let len = self.records.len();
        loop {
            let left = 2 * position + 1;
            if left >= len {
                break;
            }

            let right = left + 1;
            let smallest = if right < len && self.less(right, left) {
                right
            } else {
                left
            };

            if !self.less(smallest, position) {
                break;
            }
            self.swap(position, smallest);
            position = smallest;
        }
    }

    #[inline]
    fn less(&self, a: usize, b: usize) -> bool {
        self.records[a].expires_at < self.records[b].expires_at
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.records.swap(a, b);
        for index in [a, b] {
            let record = &mut self.records[index];
            record.position = index;
            if let Some(slot) = self.positions.get_mut(&record.key) {
                *slot = index;
            }
        }
    }

    /// Checks heap order and that both position views agree.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        if self.records.len() != self.positions.len() {
            return false;
        }

        self.records.iter().enumerate().all(|(index, record)| {
            let ordered = index == 0 || self.records[(index - 1) / 2].expires_at <= record.expires_at;
            ordered
                && record.position == index
                && self.positions.get(&record.key) == Some(&index)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn test_pop_in_expiration_order() {
        let base = Instant::now();
        let mut heap = ExpiryHeap::new();

        for (key, secs) in [("e", 5), ("a", 1), ("d", 4), ("b", 2), ("c", 3)] {
            heap.push(key.to_string(), at(base, secs));
            assert!(heap.is_consistent());
        }

        assert_eq!(heap.len(), 5);
        assert_eq!(heap.peek().map(|r| r.key.as_str()), Some("a"));

        let order: Vec<String> = std::iter::from_fn(|| heap.pop()).map(|r| r.key).collect();
        assert_eq!(order, vec!["a", "b", "c", "d", "e"]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_pop_empty() {
        let mut heap = ExpiryHeap::new();
        assert!(heap.peek().is_none());
        assert!(heap.pop().is_none());
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut heap = ExpiryHeap::new();
        heap.push("only".to_string(), Instant::now());

        assert_eq!(heap.peek().map(|r| r.position), Some(0));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_push_existing_key_updates_in_place() {
        let base = Instant::now();
        let mut heap = ExpiryHeap::new();

        heap.push("a".to_string(), at(base, 1));
        heap.push("b".to_string(), at(base, 2));
        heap.push("c".to_string(), at(base, 3));

        // Push "a" later than everything else
        assert_eq!(heap.push("a".to_string(), at(base, 10)), Some(at(base, 1)));
        assert_eq!(heap.len(), 3);
        assert!(heap.is_consistent());
        assert_eq!(heap.peek().map(|r| r.key.as_str()), Some("b"));

        // Pull "c" to the front
        assert_eq!(heap.push("c".to_string(), base), Some(at(base, 3)));
        assert!(heap.is_consistent());
        assert_eq!(heap.peek().map(|r| r.key.as_str()), Some("c"));

        assert_eq!(heap.get("a").map(|r| r.expires_at), Some(at(base, 10)));
    }

    #[test]
    fn test_remove_by_key() {
        let base = Instant::now();
        let mut heap = ExpiryHeap::new();

        for i in 0..20u64 {
            heap.push(format!("key{}", i), at(base, (i * 7) % 20));
        }

        let removed = heap.remove("key3").unwrap();
        assert_eq!(removed.key, "key3");
        assert_eq!(removed.expires_at, at(base, 1));
        assert!(heap.get("key3").is_none());
        assert!(heap.remove("key3").is_none());
        assert_eq!(heap.len(), 19);
        assert!(heap.is_consistent());

        // Removing the current minimum behaves like pop
        let min_key = heap.peek().unwrap().key.clone();
        heap.remove(&min_key).unwrap();
        assert!(heap.is_consistent());

        let mut previous = base;
        while let Some(record) = heap.pop() {
            assert!(record.expires_at >= previous);
            previous = record.expires_at;
        }
    }

    #[test]
    fn test_remove_last_element() {
        let base = Instant::now();
        let mut heap = ExpiryHeap::new();
        heap.push("a".to_string(), at(base, 1));
        heap.push("b".to_string(), at(base, 2));

        let removed = heap.remove("b").unwrap();
        assert_eq!(removed.position, 1);
        assert_eq!(heap.len(), 1);
        assert!(heap.is_consistent());
    }

    #[test]
    fn test_equal_deadlines() {
        let now = Instant::now();
        let mut heap = ExpiryHeap::new();

        for i in 0..10 {
            heap.push(format!("key{}", i), now);
        }
        assert!(heap.is_consistent());

        let mut popped = 0;
        while heap.pop().is_some() {
            popped += 1;
            assert!(heap.is_consistent());
        }
        assert_eq!(popped, 10);
    }

    #[test]
    fn test_clear() {
        let mut heap = ExpiryHeap::new();
        heap.push("a".to_string(), Instant::now());
        heap.clear();

        assert!(heap.is_empty());
        assert!(heap.get("a").is_none());
        assert!(heap.is_consistent());
    }
}

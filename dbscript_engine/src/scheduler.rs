//! Wake-time scheduler for pending script actions.
//!
//! A reversed binary heap of `(due_ms, sequence, slot)` over a slot vector. Taking an entry
//! leaves a `None` tombstone so heap indices stay valid; tombstones are compacted away once
//! enough of them pile up. Entries that become due at the same millisecond come out in the
//! order they were scheduled.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[cfg(test)]
const PLACEHOLDER_THRESHOLD: usize = 4;
#[cfg(not(test))]
const PLACEHOLDER_THRESHOLD: usize = 64;

/// Priority queue of values keyed by the millisecond they become due.
///
/// The heap top always refers to a live slot, so [`Scheduler::next_due`] is a peek.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    heap: BinaryHeap<Reverse<(u64, u64, usize)>>, /* (due_ms, seq, slot) */
    slots: Vec<Option<T>>,
    live: usize,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            slots: Vec::new(),
            live: 0,
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    /// Schedule `value` to become due at `due_ms`.
    pub fn schedule_at(&mut self, due_ms: u64, value: T) {
        let idx = self.slots.len();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse((due_ms, seq, idx)));
        self.slots.push(Some(value));
        self.live += 1;
    }

    /// Pop the next due value, if any.
    ///
    /// Returns `None` when the earliest live entry is still in the future.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, T)> {
        let Reverse((due_ms, _, idx)) = self.heap.peek().copied()?;
        if now_ms < due_ms {
            return None;
        }
        self.heap.pop();
        // take instead of remove keeps the other heap indices stable
        let value = self.slots[idx].take()?;
        self.live -= 1;
        self.drop_dead_top();
        self.compact_if_needed();
        Some((due_ms, value))
    }

    /// Earliest due time among live entries.
    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse((due, _, _))| *due)
    }

    /// Remove every pending value matching `pred` and return them.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        let mut removed = Vec::new();
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(&mut pred)
                && let Some(value) = slot.take()
            {
                removed.push(value);
            }
        }
        if !removed.is_empty() {
            self.live -= removed.len();
            self.drop_dead_top();
            self.compact_if_needed();
        }
        removed
    }

    /// Iterate over pending values in slot order.
    pub fn pending(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Pop heap entries whose slot was already taken.
    fn drop_dead_top(&mut self) {
        while let Some(Reverse((_, _, idx))) = self.heap.peek().copied()
            && self.slots[idx].is_none()
        {
            self.heap.pop();
        }
    }

    /// Rebuild the underlying storage when too many tombstones accumulate.
    fn compact_if_needed(&mut self) {
        if self.slots.len() - self.live <= PLACEHOLDER_THRESHOLD {
            return;
        }
        let old_slots = std::mem::take(&mut self.slots);
        let mut index_map = vec![None; old_slots.len()];
        for (old_idx, slot) in old_slots.into_iter().enumerate() {
            if slot.is_none() {
                continue;
            }
            index_map[old_idx] = Some(self.slots.len());
            self.slots.push(slot);
        }
        self.heap = std::mem::take(&mut self.heap)
            .into_iter()
            .filter_map(|Reverse((due_ms, seq, old_idx))| {
                index_map[old_idx].map(|new_idx| Reverse((due_ms, seq, new_idx)))
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_new_is_empty() {
        let mut scheduler: Scheduler<&str> = Scheduler::default();
        assert!(scheduler.is_empty());
        assert!(scheduler.pop_due(u64::MAX).is_none());
        assert_eq!(scheduler.next_due(), None);
    }

    #[test]
    fn pop_due_returns_none_when_nothing_due() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule_at(10, "later");
        assert!(scheduler.pop_due(9).is_none());
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.pop_due(10), Some((10, "later")));
    }

    #[test]
    fn values_come_out_in_due_order() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule_at(15, "third");
        scheduler.schedule_at(5, "first");
        scheduler.schedule_at(10, "second");

        assert_eq!(scheduler.pop_due(20).map(|(_, v)| v), Some("first"));
        assert_eq!(scheduler.pop_due(20).map(|(_, v)| v), Some("second"));
        assert_eq!(scheduler.pop_due(20).map(|(_, v)| v), Some("third"));
        assert!(scheduler.pop_due(20).is_none());
    }

    #[test]
    fn same_due_time_is_fifo() {
        let mut scheduler = Scheduler::default();
        for name in ["a", "b", "c", "d"] {
            scheduler.schedule_at(7, name);
        }
        let order: Vec<_> = std::iter::from_fn(|| scheduler.pop_due(7).map(|(_, v)| v)).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn cancelled_values_never_fire() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule_at(1, 1);
        scheduler.schedule_at(2, 2);
        scheduler.schedule_at(3, 3);
        let removed = scheduler.cancel_where(|v| *v % 2 == 1);
        assert_eq!(removed, vec![1, 3]);
        assert_eq!(scheduler.next_due(), Some(2));
        assert_eq!(scheduler.pop_due(10), Some((2, 2)));
        assert!(scheduler.pop_due(10).is_none());
    }

    #[test]
    fn compaction_keeps_remaining_order() {
        let mut scheduler = Scheduler::default();
        for i in 0..10u64 {
            scheduler.schedule_at(i, i);
        }
        for expected in 0..6u64 {
            assert_eq!(scheduler.pop_due(expected), Some((expected, expected)));
        }
        // more tombstones than the test threshold forces a rebuild
        assert!(scheduler.slots.len() < 10);
        let rest: Vec<_> = std::iter::from_fn(|| scheduler.pop_due(100).map(|(_, v)| v)).collect();
        assert_eq!(rest, vec![6, 7, 8, 9]);
    }

    #[test]
    fn counts_and_next_due_track_cancellations() {
        let mut scheduler = Scheduler::default();
        for due in [30u64, 10, 20] {
            scheduler.schedule_at(due, due);
        }
        assert_eq!(scheduler.len(), 3);
        assert_eq!(scheduler.next_due(), Some(10));

        scheduler.cancel_where(|v| *v == 10);
        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.next_due(), Some(20));

        assert_eq!(scheduler.pop_due(25), Some((20, 20)));
        assert_eq!((scheduler.len(), scheduler.next_due()), (1, Some(30)));

        scheduler.cancel_where(|_| true);
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.next_due(), None);
        assert!(scheduler.pop_due(u64::MAX).is_none());
    }
}

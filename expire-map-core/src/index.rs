//! Deadline-ordered view of the map, used only by the reclaimer.
//!
//! Keys sharing a millisecond deadline live in one bucket, which is the unit
//! of eviction. The index is never touched by `put`/`get`/`remove`; it lags
//! the entry table until the reclaimer merges the pending log into it.

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use crate::error::Inconsistency;
use crate::pending::{PendingRecord, RecordKind};

#[derive(Debug)]
pub struct DeadlineIndex<K> {
    buckets: BTreeMap<u64, HashSet<K>>,
}

impl<K> Default for DeadlineIndex<K> {
    fn default() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }
}

impl<K: Eq + Hash> DeadlineIndex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one pending record.
    ///
    /// An insertion creates the bucket on demand. A removal drops the bucket
    /// once its last key is gone, so no empty bucket is ever kept.
    pub fn apply(&mut self, record: PendingRecord<K>) -> Result<(), Inconsistency> {
        let PendingRecord {
            key,
            deadline_ms,
            kind,
        } = record;

        match kind {
            RecordKind::Insert => {
                if self.buckets.entry(deadline_ms).or_default().insert(key) {
                    Ok(())
                } else {
                    Err(Inconsistency::DuplicateInsert { deadline_ms })
                }
            }
            RecordKind::Remove => {
                let Some(bucket) = self.buckets.get_mut(&deadline_ms) else {
                    return Err(Inconsistency::MissingRemoval { deadline_ms });
                };
                if !bucket.remove(&key) {
                    return Err(Inconsistency::MissingRemoval { deadline_ms });
                }
                if bucket.is_empty() {
                    self.buckets.remove(&deadline_ms);
                }
                Ok(())
            }
        }
    }

    /// Lowest deadline currently indexed
    pub fn min_deadline(&self) -> Option<u64> {
        self.buckets.keys().next().copied()
    }

    /// Removes and returns the lowest bucket if its deadline is `<= now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, HashSet<K>)> {
        let entry = self.buckets.first_entry()?;
        if *entry.key() > now_ms {
            return None;
        }
        Some(entry.remove_entry())
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of keys across all buckets
    pub fn key_count(&self) -> usize {
        self.buckets.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(records: Vec<PendingRecord<u64>>) -> DeadlineIndex<u64> {
        let mut index = DeadlineIndex::new();
        for record in records {
            index.apply(record).unwrap();
        }
        index
    }

    #[test]
    fn test_insert_groups_keys_by_deadline() {
        let index = index_with(vec![
            PendingRecord::insert(1, 100),
            PendingRecord::insert(2, 100),
            PendingRecord::insert(3, 50),
        ]);

        assert_eq!(index.bucket_count(), 2);
        assert_eq!(index.key_count(), 3);
        assert_eq!(index.min_deadline(), Some(50));
    }

    #[test]
    fn test_removal_drops_empty_bucket() {
        let mut index = index_with(vec![
            PendingRecord::insert(1, 100),
            PendingRecord::insert(2, 200),
        ]);

        index.apply(PendingRecord::removal(1, 100)).unwrap();

        assert_eq!(index.bucket_count(), 1);
        assert_eq!(index.min_deadline(), Some(200));
    }

    #[test]
    fn test_overwrite_sequence_moves_key() {
        // put(k, 100) then put(k, 40): insert, removal of old, insert of new
        let index = index_with(vec![
            PendingRecord::insert(7, 100),
            PendingRecord::removal(7, 100),
            PendingRecord::insert(7, 40),
        ]);

        assert_eq!(index.bucket_count(), 1);
        assert_eq!(index.key_count(), 1);
        assert_eq!(index.min_deadline(), Some(40));
    }

    #[test]
    fn test_overwrite_with_same_deadline() {
        let index = index_with(vec![
            PendingRecord::insert(7, 100),
            PendingRecord::removal(7, 100),
            PendingRecord::insert(7, 100),
        ]);

        assert_eq!(index.key_count(), 1);
    }

    #[test]
    fn test_duplicate_insert_is_inconsistent() {
        let mut index = index_with(vec![PendingRecord::insert(1, 100)]);

        let result = index.apply(PendingRecord::insert(1, 100));

        assert_eq!(result, Err(Inconsistency::DuplicateInsert { deadline_ms: 100 }));
    }

    #[test]
    fn test_removal_of_unknown_key_is_inconsistent() {
        let mut index = index_with(vec![PendingRecord::insert(1, 100)]);

        assert_eq!(
            index.apply(PendingRecord::removal(2, 100)),
            Err(Inconsistency::MissingRemoval { deadline_ms: 100 })
        );
        assert_eq!(
            index.apply(PendingRecord::removal(1, 999)),
            Err(Inconsistency::MissingRemoval { deadline_ms: 999 })
        );
        // the failed removals left the existing bucket alone
        assert_eq!(index.key_count(), 1);
    }

    #[test]
    fn test_pop_due_respects_deadline() {
        let mut index = index_with(vec![
            PendingRecord::insert(1, 100),
            PendingRecord::insert(2, 100),
            PendingRecord::insert(3, 300),
        ]);

        assert!(index.pop_due(99).is_none());

        let (deadline, keys) = index.pop_due(100).unwrap();
        assert_eq!(deadline, 100);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&1) && keys.contains(&2));

        assert!(index.pop_due(299).is_none());
        assert_eq!(index.pop_due(1_000).map(|(d, _)| d), Some(300));
        assert!(index.is_empty());
        assert_eq!(index.min_deadline(), None);
    }
}

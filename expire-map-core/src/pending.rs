//! Append-only log of deadline changes awaiting merge into the
//! [`DeadlineIndex`](crate::index::DeadlineIndex).
//!
//! Mutators pay a `Vec::push` per change; the reclaimer drains the whole log
//! in one go and pays the ordered-index cost there.

/// Whether a record adds a key to a deadline bucket or takes it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Insert,
    Remove,
}

/// One queued change to the deadline index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord<K> {
    pub key: K,
    pub deadline_ms: u64,
    pub kind: RecordKind,
}

impl<K> PendingRecord<K> {
    pub fn insert(key: K, deadline_ms: u64) -> Self {
        Self {
            key,
            deadline_ms,
            kind: RecordKind::Insert,
        }
    }

    pub fn removal(key: K, deadline_ms: u64) -> Self {
        Self {
            key,
            deadline_ms,
            kind: RecordKind::Remove,
        }
    }
}

/// Records in append order. Order is significant: an overwrite appends the
/// removal of the old deadline before the insertion of the new one.
#[derive(Debug)]
pub struct PendingLog<K> {
    records: Vec<PendingRecord<K>>,
}

impl<K> Default for PendingLog<K> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<K> PendingLog<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_insert(&mut self, key: K, deadline_ms: u64) {
        self.records.push(PendingRecord::insert(key, deadline_ms));
    }

    pub fn push_removal(&mut self, key: K, deadline_ms: u64) {
        self.records.push(PendingRecord::removal(key, deadline_ms));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Yields every record in append order. The log is empty afterwards,
    /// even if the iterator is dropped early.
    pub fn drain(&mut self) -> std::vec::Drain<'_, PendingRecord<K>> {
        self.records.drain(..)
    }
}

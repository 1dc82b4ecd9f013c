/// Counters kept by the reclaimer, updated under the map's lock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimStats {
    /// Merge passes run by the reclaimer
    pub rounds: u64,
    /// Pending records folded into the deadline index
    pub merged_records: u64,
    /// Deadline buckets evicted
    pub evicted_buckets: u64,
    /// Entries removed from the table because their deadline passed
    pub evicted_entries: u64,
}

impl ReclaimStats {
    pub(crate) fn record_merge(&mut self, records: usize) {
        self.rounds += 1;
        self.merged_records += records as u64;
    }

    pub(crate) fn record_eviction(&mut self, entries: usize) {
        self.evicted_buckets += 1;
        self.evicted_entries += entries as u64;
    }
}

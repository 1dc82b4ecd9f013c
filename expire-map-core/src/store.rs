use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::clock;
use crate::config::ExpireMapConfig;
use crate::entry::Entry;
use crate::error::{ExpireMapError, Inconsistency};
use crate::index::DeadlineIndex;
use crate::pending::PendingLog;
use crate::stats::ReclaimStats;

/// Everything guarded by the map's single lock
struct MapState<K, V> {
    /// Source of truth for `get` and `size`
    entries: HashMap<K, Entry<V>>,
    /// Deadline changes not yet merged into `index`
    pending: PendingLog<K>,
    /// Read and written by the reclaimer only
    index: DeadlineIndex<K>,
    shutdown: bool,
    stats: ReclaimStats,
}

impl<K, V> MapState<K, V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            pending: PendingLog::new(),
            index: DeadlineIndex::default(),
            shutdown: false,
            stats: ReclaimStats::default(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> MapState<K, V> {
    /// Inserts or overwrites `key`. Returns `true` when the reclaimer should
    /// re-evaluate its sleep because this deadline may be the nearest one.
    fn insert(&mut self, key: K, value: V, deadline_ms: u64) -> bool {
        // The removal record for the old deadline must precede the insertion
        self.remove(&key);

        self.pending.push_insert(key.clone(), deadline_ms);
        self.entries.insert(key, Entry::new(value, deadline_ms));

        self.index
            .min_deadline()
            .map_or(true, |min| deadline_ms <= min)
    }

    fn remove(&mut self, key: &K) -> bool {
        match self.entries.remove_entry(key) {
            Some((key, entry)) => {
                self.pending.push_removal(key, entry.deadline_ms());
                true
            }
            None => false,
        }
    }

    fn lookup(&self, key: &K, now_ms: u64) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now_ms))
            .map(Entry::value)
    }

    /// Folds the pending log into the deadline index, in append order.
    fn merge_pending(&mut self) {
        let merged = self.pending.len();
        for record in self.pending.drain() {
            if let Err(err) = self.index.apply(record) {
                report_inconsistency(err);
            }
        }
        self.stats.record_merge(merged);
        if merged > 0 {
            tracing::trace!(
                merged,
                buckets = self.index.bucket_count(),
                "merged pending deadline records"
            );
        }
    }

    /// Evicts up to `max_buckets` buckets whose deadline is `<= now_ms`,
    /// lowest deadline first. Returns the number of buckets evicted.
    fn evict_due(&mut self, now_ms: u64, max_buckets: usize) -> usize {
        let mut evicted = 0;
        while evicted < max_buckets {
            let Some((deadline_ms, keys)) = self.index.pop_due(now_ms) else {
                break;
            };
            for key in &keys {
                if self.entries.remove(key).is_none() {
                    report_inconsistency(Inconsistency::MissingEntry { deadline_ms });
                }
            }
            tracing::trace!(deadline_ms, keys = keys.len(), "evicted deadline bucket");
            self.stats.record_eviction(keys.len());
            evicted += 1;
        }
        evicted
    }
}

/// Consistency failures corrupt the deadline index if ignored, so debug
/// builds stop right here.
fn report_inconsistency(err: Inconsistency) {
    if cfg!(debug_assertions) {
        panic!("expire map invariant violated: {err}");
    }
    tracing::error!(error = %err, "expire map invariant violated, record skipped");
}

/// Shared between the map handle and its reclaimer thread
struct MapInner<K, V> {
    state: Mutex<MapState<K, V>>,
    /// Wakes the reclaimer for a nearer deadline or for shutdown
    wake: Condvar,
}

impl<K, V> MapInner<K, V> {
    fn lock(&self) -> MutexGuard<'_, MapState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Thread-safe key/value map whose entries expire after a per-entry TTL.
///
/// `put`, `get` and `remove` touch only a hash table and an append-only log
/// under one mutex, so they are O(1) and never wait for eviction work. A
/// single background thread (the reclaimer) merges the log into a
/// deadline-ordered index and evicts due entries in bounded batches,
/// sleeping until the next deadline in between.
///
/// Expired entries read as absent immediately, even before the reclaimer has
/// removed them, so `size()` may briefly count them.
///
/// Dropping the map stops and joins the reclaimer.
///
/// # Example
///
/// ```rust,no_run
/// use expire_map_core::ExpireMap;
///
/// let map: ExpireMap<u64, u64> = ExpireMap::new();
/// map.put(1, 1234, 1_000); // expires in one second
/// assert_eq!(map.get(&1), Some(1234));
/// ```
pub struct ExpireMap<K, V> {
    inner: Arc<MapInner<K, V>>,
    reclaimer: Option<JoinHandle<()>>,
}

impl<K, V> ExpireMap<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Creates a map with default configuration and starts its reclaimer
    ///
    /// # Panics
    ///
    /// Panics if the reclaimer thread cannot be spawned, like
    /// [`std::thread::spawn`]. Use [`ExpireMap::try_with_config`] to handle
    /// that case.
    pub fn new() -> Self {
        Self::with_config(ExpireMapConfig::default())
    }

    /// Creates a map with custom configuration
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid or the reclaimer thread cannot
    /// be spawned.
    pub fn with_config(config: ExpireMapConfig) -> Self {
        match Self::try_with_config(config) {
            Ok(map) => map,
            Err(err) => panic!("failed to start expire map: {err}"),
        }
    }

    /// Creates a map with custom configuration, reporting startup failures
    pub fn try_with_config(config: ExpireMapConfig) -> Result<Self, ExpireMapError> {
        config.validate()?;

        let inner = Arc::new(MapInner {
            state: Mutex::new(MapState::new()),
            wake: Condvar::new(),
        });

        let reclaimer_inner = Arc::clone(&inner);
        let reclaimer = thread::Builder::new()
            .name(config.reclaimer_thread_name.clone())
            .spawn(move || reclaim_loop(reclaimer_inner, config))?;

        Ok(Self {
            inner,
            reclaimer: Some(reclaimer),
        })
    }

    /// Stores `value` under `key` until `ttl_ms` milliseconds from now.
    ///
    /// An existing entry is replaced, value and deadline both; its old
    /// deadline no longer applies. A TTL of 0 stores an already expired entry.
    pub fn put(&self, key: K, value: V, ttl_ms: u64) {
        let deadline_ms = clock::deadline_after(ttl_ms);
        let wake = self.inner.lock().insert(key, value, deadline_ms);
        if wake {
            self.inner.wake.notify_one();
        }
    }

    /// Returns a copy of the value, or `None` if absent or expired
    pub fn get(&self, key: &K) -> Option<V> {
        let now_ms = clock::now_ms();
        self.inner.lock().lookup(key, now_ms).cloned()
    }

    /// Checks if a key exists and is not expired
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        let now_ms = clock::now_ms();
        self.inner.lock().lookup(key, now_ms).is_some()
    }

    /// Removes the entry for `key`. Absent keys are ignored.
    pub fn remove(&self, key: &K) {
        self.inner.lock().remove(key);
    }

    /// Returns the number of stored entries, including expired entries the
    /// reclaimer has not evicted yet
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns `true` if `size()` is 0
    #[must_use]
    pub fn empty(&self) -> bool {
        self.size() == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.empty()
    }

    /// Number of deadline changes not yet merged by the reclaimer
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Snapshot of the reclaimer counters
    pub fn stats(&self) -> ReclaimStats {
        self.inner.lock().stats
    }

    /// Stops the reclaimer, waits for it to exit and returns its final
    /// counters. Dropping the map does the same.
    pub fn shutdown(mut self) -> ReclaimStats {
        self.stop_reclaimer()
    }
}

impl<K, V> ExpireMap<K, V> {
    fn stop_reclaimer(&mut self) -> ReclaimStats {
        if let Some(handle) = self.reclaimer.take() {
            self.inner.lock().shutdown = true;
            self.inner.wake.notify_all();
            if handle.join().is_err() {
                tracing::error!("expire map reclaimer panicked");
            }
        }
        self.inner.lock().stats
    }
}

impl<K, V> Default for ExpireMap<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for ExpireMap<K, V> {
    fn drop(&mut self) {
        self.stop_reclaimer();
    }
}

/// Body of the reclaimer thread.
///
/// Every round starts with a merge, then either stops (shutdown), parks
/// indefinitely (no deadlines), parks until the nearest deadline, or evicts
/// one batch of due buckets. The lock is released between rounds.
fn reclaim_loop<K: Eq + Hash + Clone, V>(inner: Arc<MapInner<K, V>>, config: ExpireMapConfig) {
    tracing::debug!(
        max_reclaim_buckets = config.max_reclaim_buckets,
        "expire map reclaimer started"
    );

    loop {
        let mut state = inner.lock();
        state.merge_pending();

        if state.shutdown {
            tracing::debug!(stats = ?state.stats, "expire map reclaimer stopped");
            return;
        }

        let now_ms = clock::now_ms();
        match state.index.min_deadline() {
            None => {
                tracing::debug!("no deadlines indexed, reclaimer parked");
                drop(inner.wake.wait(state).unwrap_or_else(PoisonError::into_inner));
            }
            Some(min_deadline) if min_deadline > now_ms => {
                let park = Duration::from_millis(min_deadline - now_ms).min(config.max_park);
                tracing::debug!(
                    wait_ms = park.as_millis() as u64,
                    min_deadline,
                    "nothing due, reclaimer parked"
                );
                drop(
                    inner
                        .wake
                        .wait_timeout(state, park)
                        .unwrap_or_else(PoisonError::into_inner),
                );
            }
            Some(_) => {
                state.evict_due(now_ms, config.max_reclaim_buckets);
            }
        }
    }
}

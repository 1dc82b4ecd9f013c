//! # Expire Map Core
//!
//! A thread-safe in-memory key/value map where every entry expires after its
//! own TTL.
//!
//! ## Features
//!
//! - O(1) `put`/`get`/`remove` under a single mutex; mutators only append to a
//!   pending log and never maintain deadline order themselves
//! - Automatic expiration on read (lazy expiry)
//! - One background reclaimer thread per map that merges the pending log into
//!   a deadline-ordered index and evicts due entries in bounded batches,
//!   sleeping until the next deadline
//! - Deterministic teardown: dropping the map stops and joins the reclaimer
//!
//! ## Example
//!
//! ```rust,no_run
//! use expire_map_core::{ExpireMap, ExpireMapConfig};
//!
//! // Create a map with the default config (10 buckets per reclamation round)
//! let map: ExpireMap<u64, u64> = ExpireMap::new();
//!
//! // Or with a custom batch size
//! let config = ExpireMapConfig::default().with_max_reclaim_buckets(32);
//! let map: ExpireMap<u64, u64> = ExpireMap::with_config(config);
//!
//! // Store a value with a one second TTL
//! map.put(1, 1234, 1_000);
//!
//! if let Some(value) = map.get(&1) {
//!     println!("value: {}", value);
//! }
//!
//! map.remove(&1);
//! assert!(map.empty());
//! ```

pub mod clock;
mod config;
mod entry;
mod error;
mod index;
mod pending;
mod stats;
mod store;

pub use config::{ExpireMapConfig, ENV_MAX_PARK_MS, ENV_MAX_RECLAIM_BUCKETS};
pub use entry::Entry;
pub use error::{ExpireMapError, Inconsistency};
pub use index::DeadlineIndex;
pub use pending::{PendingLog, PendingRecord, RecordKind};
pub use stats::ReclaimStats;
pub use store::ExpireMap;

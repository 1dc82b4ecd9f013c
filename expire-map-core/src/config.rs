use std::time::Duration;

use crate::error::ExpireMapError;

/// Environment variable overriding [`ExpireMapConfig::max_reclaim_buckets`]
pub const ENV_MAX_RECLAIM_BUCKETS: &str = "EXPIRE_MAP_MAX_RECLAIM_BUCKETS";

/// Environment variable overriding [`ExpireMapConfig::max_park`], in milliseconds
pub const ENV_MAX_PARK_MS: &str = "EXPIRE_MAP_MAX_PARK_MS";

/// Configuration for the map's background reclaimer
///
/// # Example
///
/// ```rust
/// use expire_map_core::ExpireMapConfig;
/// use std::time::Duration;
///
/// let config = ExpireMapConfig::default()
///     .with_max_reclaim_buckets(32)
///     .with_max_park(Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpireMapConfig {
    /// Deadline buckets evicted per round before the lock is released (default: 10)
    pub max_reclaim_buckets: usize,
    /// Longest single timed wait of the reclaimer (default: 60 seconds)
    pub max_park: Duration,
    /// Name given to the reclaimer thread
    pub reclaimer_thread_name: String,
}

impl Default for ExpireMapConfig {
    fn default() -> Self {
        Self {
            max_reclaim_buckets: 10,
            max_park: Duration::from_secs(60),
            reclaimer_thread_name: "expire-map-reclaimer".to_string(),
        }
    }
}

impl ExpireMapConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads overrides from the environment.
    ///
    /// Reads:
    /// - `EXPIRE_MAP_MAX_RECLAIM_BUCKETS` - buckets per reclamation round
    /// - `EXPIRE_MAP_MAX_PARK_MS` - longest timed wait in milliseconds
    ///
    /// Missing or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_reclaim_buckets = std::env::var(ENV_MAX_RECLAIM_BUCKETS)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(defaults.max_reclaim_buckets);
        let max_park = std::env::var(ENV_MAX_PARK_MS)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.max_park);

        Self {
            max_reclaim_buckets,
            max_park,
            ..defaults
        }
    }

    /// Sets how many deadline buckets one reclamation round may evict.
    ///
    /// Smaller batches release the lock sooner for mutators; larger batches
    /// drain a backlog of expired entries in fewer rounds. Correctness does not
    /// depend on the value, but it must be positive.
    pub fn with_max_reclaim_buckets(mut self, buckets: usize) -> Self {
        self.max_reclaim_buckets = buckets;
        self
    }

    /// Caps a single timed wait of the reclaimer
    pub fn with_max_park(mut self, max_park: Duration) -> Self {
        self.max_park = max_park;
        self
    }

    pub fn with_reclaimer_thread_name(mut self, name: impl Into<String>) -> Self {
        self.reclaimer_thread_name = name.into();
        self
    }

    /// Rejects values the reclaimer cannot run with
    pub fn validate(&self) -> Result<(), ExpireMapError> {
        if self.max_reclaim_buckets == 0 {
            return Err(ExpireMapError::InvalidConfig {
                reason: "max_reclaim_buckets must be positive".to_string(),
            });
        }
        if self.max_park.is_zero() {
            return Err(ExpireMapError::InvalidConfig {
                reason: "max_park must be positive".to_string(),
            });
        }
        Ok(())
    }
}

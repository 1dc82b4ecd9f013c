use thiserror::Error;

/// Errors returned when building an [`ExpireMap`](crate::ExpireMap).
#[derive(Debug, Error)]
pub enum ExpireMapError {
    /// The configuration was rejected before any thread was started
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The operating system refused to start the reclaimer thread
    #[error("failed to spawn reclaimer thread: {0}")]
    SpawnReclaimer(#[from] std::io::Error),
}

/// A broken invariant between the pending log, the deadline index and the
/// entry table.
///
/// These are defects, never caller errors. Debug builds panic on them; release
/// builds log them and skip the offending record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Inconsistency {
    /// An insertion record named a key already present in its bucket
    #[error("key inserted twice into deadline bucket {deadline_ms}")]
    DuplicateInsert { deadline_ms: u64 },

    /// A removal record named a key missing from its bucket
    #[error("removal record for deadline {deadline_ms} has no matching key in the index")]
    MissingRemoval { deadline_ms: u64 },

    /// A due bucket named a key missing from the entry table
    #[error("key in due bucket {deadline_ms} is missing from the entry table")]
    MissingEntry { deadline_ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = ExpireMapError::InvalidConfig {
            reason: "max_reclaim_buckets must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration: max_reclaim_buckets must be positive"
        );
    }

    #[test]
    fn test_spawn_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no threads left");
        let err: ExpireMapError = io.into();
        assert!(matches!(err, ExpireMapError::SpawnReclaimer(_)));
        assert!(err.to_string().contains("no threads left"));
    }

    #[test]
    fn test_inconsistency_names_deadline() {
        let err = Inconsistency::MissingRemoval { deadline_ms: 42 };
        assert!(err.to_string().contains("42"));
    }
}

/// Represents a stored value with its absolute deadline
#[derive(Debug, Clone)]
pub struct Entry<V> {
    value: V,
    deadline_ms: u64,
}

impl<V> Entry<V> {
    /// Creates a new entry with the given value and deadline
    pub fn new(value: V, deadline_ms: u64) -> Self {
        Self { value, deadline_ms }
    }

    /// Returns the stored value
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the deadline in milliseconds on the [`crate::clock`] timeline
    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    /// Checks if this entry has expired at `now_ms`.
    ///
    /// An entry whose deadline equals the current time is already expired.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.deadline_ms <= now_ms
    }
}

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Returns the current time in milliseconds since a process-wide epoch.
///
/// The epoch is captured the first time the clock is read, so values are only
/// comparable within one process. The clock is monotonic: wall-clock
/// adjustments never move deadlines.
pub fn now_ms() -> u64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    // u64 milliseconds cover ~584 million years of uptime
    epoch.elapsed().as_millis() as u64
}

/// Converts a TTL into an absolute deadline, saturating at `u64::MAX`.
pub fn deadline_after(ttl_ms: u64) -> u64 {
    now_ms().saturating_add(ttl_ms)
}

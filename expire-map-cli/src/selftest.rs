//! Timed end-to-end scenarios run against a live map.
//!
//! Every duration is expressed in "units" of `scale_ms` milliseconds, so the
//! same scenarios run at full speed (1000ms units) or compressed.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use expire_map_core::{ExpireMap, ExpireMapConfig};

struct Scale {
    unit_ms: u64,
}

impl Scale {
    fn units(&self, n: u64) -> u64 {
        self.unit_ms * n
    }

    /// A tenth of a unit, the short TTL of the scenarios
    fn tenth(&self) -> u64 {
        (self.unit_ms / 10).max(1)
    }

    fn sleep_ms(&self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}

/// Polls `condition` until it holds or `timeout_ms` passes
fn eventually(timeout_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Runs every scenario, stopping at the first failed expectation.
pub fn run(config: &ExpireMapConfig, scale_ms: u64) -> Result<()> {
    ensure!(scale_ms > 0, "scale must be positive");
    let scale = Scale { unit_ms: scale_ms };

    let started = Instant::now();
    simple(config, &scale).context("simple test failed")?;
    concurrency(config, &scale).context("concurrency test failed")?;

    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "✅ all tests passed");
    Ok(())
}

fn simple(config: &ExpireMapConfig, scale: &Scale) -> Result<()> {
    tracing::info!("starting simple test");
    let map: ExpireMap<u64, u64> = ExpireMap::try_with_config(config.clone())?;

    // get/put
    let (key, value) = (1, 1234);
    ensure!(map.get(&key).is_none(), "empty map returned a value");

    map.put(key, value, scale.units(1));
    ensure!(
        map.get(&key) == Some(value),
        "value not readable right after put"
    );

    scale.sleep_ms(scale.units(1));
    ensure!(map.get(&key).is_none(), "value readable after its TTL");

    // overwrite with a shorter TTL
    map.put(key, value, scale.units(1));
    map.put(key, value, scale.tenth());
    scale.sleep_ms(scale.tenth());
    ensure!(
        map.get(&key).is_none(),
        "shorter overwrite TTL was not honored"
    );

    // remove
    map.put(key, value, scale.units(1));
    map.remove(&key);
    ensure!(map.get(&key).is_none(), "value readable after remove");

    // staggered TTLs
    map.put(1, 1, scale.units(1));
    map.put(2, 2, scale.tenth());
    map.put(3, 3, scale.units(2));

    scale.sleep_ms(scale.tenth());
    ensure!(map.get(&2).is_none(), "key 2 outlived its TTL");
    scale.sleep_ms(scale.units(1));
    ensure!(map.get(&1).is_none(), "key 1 outlived its TTL");
    scale.sleep_ms(scale.units(2));
    ensure!(map.get(&3).is_none(), "key 3 outlived its TTL");
    ensure!(
        eventually(scale.units(1), || map.empty()),
        "reclaimer left {} entries behind",
        map.size()
    );

    // repeated overwrites, the last one wins
    for units in [100, 50, 25, 12, 6, 3, 1] {
        map.put(1, 1, scale.units(units));
    }
    scale.sleep_ms(scale.units(1));
    ensure!(map.get(&1).is_none(), "earlier, longer TTL survived overwrite");

    // interleaved removes and overwrites
    map.put(1, 1, scale.units(100));
    map.remove(&1);
    map.put(1, 1, scale.units(25));
    map.put(1, 1, scale.units(12));
    map.remove(&1);
    map.put(1, 1, scale.units(6));
    map.put(1, 1, scale.units(3));
    map.remove(&1);
    map.put(1, 1, scale.units(1));
    map.remove(&1);
    scale.sleep_ms(scale.units(1));
    ensure!(map.get(&1).is_none(), "removed key is readable");

    let stats = map.shutdown();
    tracing::info!(?stats, "done simple test");
    Ok(())
}

/// Parallel puts, removes and overwrites. Nothing deterministic here beyond
/// the map draining completely once every TTL has passed.
fn concurrency(config: &ExpireMapConfig, scale: &Scale) -> Result<()> {
    tracing::info!("starting concurrency test");
    let map: Arc<ExpireMap<u64, u64>> = Arc::new(ExpireMap::try_with_config(config.clone())?);

    let long_ttl = scale.units(2);
    let short_ttl = scale.units(1);

    let t1 = {
        let map = Arc::clone(&map);
        thread::spawn(move || {
            for i in 1..=25 {
                map.put(i, i, i + long_ttl);
            }
        })
    };
    let t2 = {
        let map = Arc::clone(&map);
        thread::spawn(move || {
            for i in 1..=15 {
                map.remove(&i);
            }
        })
    };
    let t3 = {
        let map = Arc::clone(&map);
        thread::spawn(move || {
            for i in 16..=30 {
                map.put(i, i, i + short_ttl);
            }
        })
    };

    for handle in [t1, t2, t3] {
        if handle.join().is_err() {
            anyhow::bail!("worker thread panicked");
        }
    }

    // wait a certain amount more than the largest TTL
    scale.sleep_ms(scale.units(3));
    ensure!(
        eventually(scale.units(1), || map.empty()),
        "map still holds {} entries",
        map.size()
    );

    tracing::info!("done concurrency test");
    Ok(())
}

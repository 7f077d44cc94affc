use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::aggregator::SeriesVersion;

use super::horizon::HorizonDistribution;

/// Horizon distributions keyed by `(horizon, series version)`.
///
/// The version only moves when a new bucket opens, so a distribution built
/// earlier in the current bucket is reused while that bucket's mean keeps
/// accumulating.
#[derive(Debug, Default)]
pub struct DistributionCache {
    entries: Mutex<HashMap<&'static str, (SeriesVersion, Arc<HorizonDistribution>)>>,
}

impl DistributionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &self,
        horizon_key: &'static str,
        version: SeriesVersion,
        build: impl FnOnce() -> HorizonDistribution,
    ) -> Arc<HorizonDistribution> {
        if let Some(hit) = self.lookup(horizon_key, version) {
            return hit;
        }

        // built outside the lock; a racing builder just overwrites an equal entry
        let dist = Arc::new(build());
        tracing::debug!(
            horizon = horizon_key,
            buckets = version.len,
            multiples = dist.ranked.len(),
            "Rebuilt horizon distribution"
        );
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(horizon_key, (version, Arc::clone(&dist)));
        dist
    }

    fn lookup(&self, horizon_key: &str, version: SeriesVersion) -> Option<Arc<HorizonDistribution>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(horizon_key)
            .filter(|(v, _)| *v == version)
            .map(|(_, d)| Arc::clone(d))
    }

    pub fn invalidate(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::WinsorBounds;
    use chrono::{TimeZone, Utc};

    fn version(hour: u32, len: usize) -> SeriesVersion {
        SeriesVersion {
            latest_bucket: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            len,
        }
    }

    #[test]
    fn rebuilds_only_when_version_changes() {
        let cache = DistributionCache::new();
        let prices = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut builds = 0;

        let a = cache.get_or_build("30d", version(1, 5), || {
            builds += 1;
            HorizonDistribution::build(&prices, 2, WinsorBounds::default(), |_| true)
        });
        let b = cache.get_or_build("30d", version(1, 5), || {
            builds += 1;
            HorizonDistribution::build(&prices, 2, WinsorBounds::default(), |_| true)
        });
        assert!(Arc::ptr_eq(&a, &b));

        let c = cache.get_or_build("30d", version(2, 6), || {
            builds += 1;
            HorizonDistribution::build(&prices, 2, WinsorBounds::default(), |_| true)
        });
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(builds, 2);
    }

    #[test]
    fn horizons_are_cached_independently() {
        let cache = DistributionCache::new();
        let prices = [1.0, 2.0, 3.0];
        let a = cache.get_or_build("30d", version(1, 3), || {
            HorizonDistribution::build(&prices, 1, WinsorBounds::default(), |_| true)
        });
        let b = cache.get_or_build("365d", version(1, 3), || {
            HorizonDistribution::build(&prices, 2, WinsorBounds::default(), |_| true)
        });
        assert_eq!(a.window, 1);
        assert_eq!(b.window, 2);
        cache.invalidate();
        let c = cache.get_or_build("30d", version(1, 3), || {
            HorizonDistribution::build(&prices, 1, WinsorBounds::default(), |_| true)
        });
        assert!(!Arc::ptr_eq(&a, &c));
    }
}

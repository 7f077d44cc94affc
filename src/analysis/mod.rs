pub mod cache;
pub mod history;
pub mod horizon;

use chrono::{DateTime, Utc};

use crate::aggregator::{SeriesAggregator, SeriesVersion};
use crate::model::{
    AggregatedPoint, History, Horizon, HorizonPair, PriceMultiple, PriceSample, Summary,
};
use crate::stats::WinsorBounds;

pub use cache::DistributionCache;
pub use history::build_history;
pub use horizon::{
    analyze_horizon, analyze_with, distribution_since_cutoff, HorizonDistribution,
};

/// 2015-01-01T00:00:00Z, the start of the history ranking baseline.
pub const HISTORY_CUTOFF_UNIX: i64 = 1_420_070_400;

pub fn default_cutoff() -> DateTime<Utc> {
    DateTime::from_timestamp(HISTORY_CUTOFF_UNIX, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingParams {
    pub bounds: WinsorBounds,
    /// Buckets before this instant stay out of the history ranking distributions.
    pub cutoff: DateTime<Utc>,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self {
            bounds: WinsorBounds::default(),
            cutoff: default_cutoff(),
        }
    }
}

/// Snapshot of one horizon's series taken under the aggregator lock.
#[derive(Debug, Clone)]
pub struct SeriesSnapshot {
    pub horizon: Horizon,
    pub points: Vec<AggregatedPoint>,
}

impl SeriesSnapshot {
    pub fn take(aggregator: &SeriesAggregator, horizon: Horizon) -> Self {
        Self {
            horizon,
            points: aggregator.for_horizon(&horizon).points(),
        }
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.mean_price).collect()
    }

    fn version(&self) -> Option<SeriesVersion> {
        self.points.last().map(|p| SeriesVersion {
            latest_bucket: p.bucket_start,
            len: self.points.len(),
        })
    }
}

/// Live "as of now" analysis with cached history distributions.
#[derive(Debug, Default)]
pub struct HorizonAnalyzer {
    params: RankingParams,
    cache: DistributionCache,
}

impl HorizonAnalyzer {
    pub fn new(params: RankingParams) -> Self {
        Self {
            params,
            cache: DistributionCache::new(),
        }
    }

    pub fn params(&self) -> &RankingParams {
        &self.params
    }

    pub fn analyze(
        &self,
        current_price: f64,
        snapshot: &SeriesSnapshot,
        now: DateTime<Utc>,
    ) -> PriceMultiple {
        let horizon = snapshot.horizon;
        match snapshot.version() {
            Some(version) => {
                let prices = snapshot.prices();
                analyze_with(current_price, &prices, &horizon, now, || {
                    self.cache.get_or_build(horizon.key, version, || {
                        distribution_since_cutoff(
                            &snapshot.points,
                            horizon.window_length,
                            &self.params,
                        )
                    })
                })
            }
            None => {
                analyze_horizon(current_price, &snapshot.points, &horizon, now, &self.params)
            }
        }
    }

    /// Both horizons for one live sample.
    pub fn summarize(
        &self,
        sample: &PriceSample,
        price_source: &str,
        daily: &SeriesSnapshot,
        hourly: &SeriesSnapshot,
        now: DateTime<Utc>,
    ) -> Summary {
        Summary {
            as_of_utc: now,
            current_price_usd: sample.price,
            price_source: price_source.to_string(),
            price_as_of_utc: sample.timestamp,
            horizons: HorizonPair {
                long: self.analyze(sample.price, daily, now),
                short: self.analyze(sample.price, hourly, now),
            },
        }
    }
}

/// Whole-series history for both horizons, recomputed from the aggregator.
pub fn compute_history(
    daily: &SeriesSnapshot,
    hourly: &SeriesSnapshot,
    params: &RankingParams,
) -> History {
    History {
        horizons: HorizonPair {
            long: build_history(&daily.points, daily.horizon.window_length, params),
            short: build_history(&hourly.points, hourly.horizon.window_length, params),
        },
    }
}

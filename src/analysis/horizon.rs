use chrono::{DateTime, Utc};

use crate::indicator::sma;
use crate::indicator::volatility::{log_multiples, rolling_sigma, z_scores};
use crate::model::{AggregatedPoint, Horizon, Label, PriceMultiple};
use crate::stats::{RankedDistribution, WinsorBounds};

use super::RankingParams;

/// Everything about a horizon's history that does not depend on the live price.
///
/// `multiples[i]` is the multiple an observer saw at bucket `i` using only the
/// `window` buckets before it, so positions `< window` are `None`.
#[derive(Debug, Clone)]
pub struct HorizonDistribution {
    pub window: usize,
    pub multiples: Vec<Option<f64>>,
    pub ranked: RankedDistribution,
    /// z-scores of positions admitted by the base filter (cutoff) only.
    pub ranked_z: RankedDistribution,
    /// Sigma of the log-multiples over the last `window` buckets.
    pub sigma_now: Option<f64>,
}

impl HorizonDistribution {
    /// Raw multiples rank against every position; the z base keeps only
    /// positions where `in_base(i)` holds.
    pub fn build(
        prices: &[f64],
        window: usize,
        bounds: WinsorBounds,
        in_base: impl Fn(usize) -> bool,
    ) -> Self {
        let n = prices.len();
        let multiples: Vec<Option<f64>> = (0..n)
            .map(|i| {
                if window == 0 || i < window {
                    return None;
                }
                let prior = sma(&prices[i - window..i], window);
                (prior > 0.0).then(|| prices[i] / prior)
            })
            .collect();

        let defined: Vec<f64> = multiples.iter().flatten().copied().collect();
        let ranked = RankedDistribution::winsorized(&defined, bounds);

        // one extra slot so the rolling sigma also covers "now"
        let mut log_r = log_multiples(&multiples);
        log_r.push(None);
        let sigma = rolling_sigma(&log_r, window);
        let z = z_scores(&log_r[..n], &sigma[..n]);
        let z_defined: Vec<f64> = z
            .into_iter()
            .enumerate()
            .filter(|(i, _)| in_base(*i))
            .filter_map(|(_, z)| z)
            .collect();
        let ranked_z = RankedDistribution::winsorized(&z_defined, bounds);

        Self {
            window,
            multiples,
            ranked,
            ranked_z,
            sigma_now: sigma[n],
        }
    }

    /// Multiples of the last `window` buckets that had a full prior window.
    pub fn window_multiples(&self) -> impl Iterator<Item = f64> + '_ {
        let start = self.multiples.len().saturating_sub(self.window);
        self.multiples[start..].iter().flatten().copied()
    }

    pub fn vol_adjusted_percentile(&self, multiple: f64) -> f64 {
        match self.sigma_now {
            Some(sigma) if multiple > 0.0 && !self.ranked_z.is_empty() => {
                self.ranked_z.percentile_of(multiple.ln() / sigma) * 100.0
            }
            _ => f64::NAN,
        }
    }
}

/// Distribution of an aggregated series with the z base restricted to buckets
/// at or after `params.cutoff`.
pub fn distribution_since_cutoff(
    points: &[AggregatedPoint],
    window: usize,
    params: &RankingParams,
) -> HorizonDistribution {
    let prices: Vec<f64> = points.iter().map(|p| p.mean_price).collect();
    HorizonDistribution::build(&prices, window, params.bounds, |i| {
        points[i].bucket_start >= params.cutoff
    })
}

/// Multiple of `current_price` against the trailing SMA of the `historical`
/// bucket means, ranked against the no-look-ahead multiples of the same history.
pub fn analyze_horizon(
    current_price: f64,
    historical: &[AggregatedPoint],
    horizon: &Horizon,
    now: DateTime<Utc>,
    params: &RankingParams,
) -> PriceMultiple {
    let prices: Vec<f64> = historical.iter().map(|p| p.mean_price).collect();
    analyze_with(current_price, &prices, horizon, now, || {
        distribution_since_cutoff(historical, horizon.window_length, params)
    })
}

/// Same as [`analyze_horizon`] with the history distribution supplied lazily,
/// so callers can serve it from a cache.
pub fn analyze_with<D>(
    current_price: f64,
    historical_prices: &[f64],
    horizon: &Horizon,
    now: DateTime<Utc>,
    distribution: impl FnOnce() -> D,
) -> PriceMultiple
where
    D: AsRef<HorizonDistribution>,
{
    let window = horizon.window_length;
    let sample_size = historical_prices.len();
    if sample_size < window {
        return PriceMultiple::degenerate(sample_size, window, now);
    }

    let trailing = sma(historical_prices, window);
    if trailing.is_nan() || trailing <= 0.0 {
        return PriceMultiple::degenerate(sample_size, window, now);
    }
    let multiple = current_price / trailing;

    let dist = distribution();
    let dist = dist.as_ref();
    if dist.ranked.is_empty() {
        return PriceMultiple {
            multiple,
            sma: trailing,
            ..PriceMultiple::degenerate(sample_size, window, now)
        };
    }

    let percentile = dist.ranked.percentile_of(multiple);
    let mut window_count = 0usize;
    let mut count_higher = 0usize;
    for m in dist.window_multiples() {
        window_count += 1;
        if m > multiple {
            count_higher += 1;
        }
    }

    let label = Label::from_percentile(percentile);
    PriceMultiple {
        multiple,
        percentile,
        vol_adj_percentile: dist.vol_adjusted_percentile(multiple),
        higher_than_percent: dist.ranked.higher_than_percent(multiple),
        label,
        tone: label.tone(),
        sma: trailing,
        sma_as_of_utc: horizon.granularity.bucket_start(now),
        sample_size,
        historical_average: dist.ranked.mean(),
        count_higher_in_window: count_higher,
        window_length: window_count,
    }
}

impl AsRef<HorizonDistribution> for HorizonDistribution {
    fn as_ref(&self) -> &HorizonDistribution {
        self
    }
}

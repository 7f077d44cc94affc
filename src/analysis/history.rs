use crate::indicator::volatility::vol_adjusted_percentiles;
use crate::indicator::TrailingSma;
use crate::model::{AggregatedPoint, HistoryPoint};
use crate::stats::RankedDistribution;

use super::RankingParams;

/// Walk a full aggregated series once and rank every bucket.
///
/// Bucket `i` is compared with the mean of buckets `[i - window, i)`, so the first
/// `window` points carry no SMA or multiple. Percentiles rank each defined multiple
/// against one winsorized distribution of the multiples at or after the cutoff.
pub fn build_history(
    points: &[AggregatedPoint],
    window: usize,
    params: &RankingParams,
) -> Vec<HistoryPoint> {
    let mut trailing = TrailingSma::new(window);
    let mut smas = Vec::with_capacity(points.len());
    let mut multiples = Vec::with_capacity(points.len());
    for p in points {
        let sma = trailing.advance(p.mean_price);
        smas.push(sma);
        multiples.push(sma.filter(|s| *s > 0.0).map(|s| p.mean_price / s));
    }

    let base: Vec<f64> = points
        .iter()
        .zip(&multiples)
        .filter(|(p, _)| p.bucket_start >= params.cutoff)
        .filter_map(|(_, m)| *m)
        .collect();
    let ranked = RankedDistribution::winsorized(&base, params.bounds);

    let vol_adj = vol_adjusted_percentiles(&multiples, window, params.bounds, |i| {
        points[i].bucket_start >= params.cutoff
    });

    points
        .iter()
        .enumerate()
        .map(|(i, p)| HistoryPoint {
            t: p.bucket_start,
            price: p.mean_price,
            sma: smas[i],
            multiple: multiples[i],
            percentile: multiples[i]
                .filter(|_| !ranked.is_empty())
                .map(|m| ranked.percentile_of(m) * 100.0),
            vol_adj_percentile: vol_adj[i],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn daily(prices: &[f64]) -> Vec<AggregatedPoint> {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| AggregatedPoint::new(start + Duration::days(i as i64), *p))
            .collect()
    }

    #[test]
    fn first_window_points_are_undefined() {
        let points = daily(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let h = build_history(&points, 3, &RankingParams::default());
        assert_eq!(h.len(), 5);
        for p in &h[..3] {
            assert_eq!(p.sma, None);
            assert_eq!(p.multiple, None);
            assert_eq!(p.percentile, None);
            assert_eq!(p.vol_adj_percentile, None);
        }
        assert!((h[3].sma.unwrap() - 11.0).abs() < 1e-12);
        assert!((h[3].multiple.unwrap() - 13.0 / 11.0).abs() < 1e-12);
        assert!((h[4].sma.unwrap() - 12.0).abs() < 1e-12);
        assert_eq!(h[4].t, points[4].bucket_start);
    }

    #[test]
    fn percentiles_rank_against_the_whole_series() {
        let points = daily(&[10.0, 10.0, 10.0, 12.0, 9.0, 11.0, 10.0]);
        let h = build_history(&points, 3, &RankingParams::default());
        let defined: Vec<f64> = h.iter().filter_map(|p| p.percentile).collect();
        assert_eq!(defined.len(), 4);
        assert!(defined.iter().all(|p| (0.0..=100.0).contains(p)));
        // the largest multiple sits at the top of the distribution
        let top = h
            .iter()
            .filter(|p| p.multiple.is_some())
            .max_by(|a, b| a.multiple.unwrap().total_cmp(&b.multiple.unwrap()))
            .unwrap();
        assert!((top.percentile.unwrap() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn points_before_cutoff_do_not_shape_the_distribution() {
        let points = daily(&[10.0, 10.0, 20.0, 10.0, 10.0, 11.0]);
        let params = RankingParams {
            cutoff: points[4].bucket_start,
            ..RankingParams::default()
        };
        let h = build_history(&points, 2, &params);
        // base distribution holds only positions 4 and 5
        let m4 = h[4].multiple.unwrap();
        let m5 = h[5].multiple.unwrap();
        assert!(m4 < m5);
        assert!((h[4].percentile.unwrap() - 50.0).abs() < 1e-12);
        assert!((h[5].percentile.unwrap() - 100.0).abs() < 1e-12);
        // a pre-cutoff spike is still ranked, against the later distribution
        assert!((h[2].percentile.unwrap() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn empty_series_builds_empty_history() {
        assert!(build_history(&[], 5, &RankingParams::default()).is_empty());
    }
}

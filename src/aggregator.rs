use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{AggregatedPoint, Granularity, Horizon, PriceSample};

/// Identity of a series state: latest bucket plus bucket count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesVersion {
    pub latest_bucket: DateTime<Utc>,
    pub len: usize,
}

/// Calendar-aligned buckets of one granularity, ordered by bucket start.
#[derive(Debug, Clone)]
pub struct BucketSeries {
    granularity: Granularity,
    buckets: BTreeMap<DateTime<Utc>, AggregatedPoint>,
}

impl BucketSeries {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            buckets: BTreeMap::new(),
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Fold a sample into its bucket's running mean, opening the bucket if new.
    pub fn add(&mut self, sample: &PriceSample) {
        let start = self.granularity.bucket_start(sample.timestamp);
        self.buckets
            .entry(start)
            .and_modify(|p| p.add(sample.price))
            .or_insert_with(|| AggregatedPoint::new(start, sample.price));
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Snapshot copy of all buckets, oldest first.
    pub fn points(&self) -> Vec<AggregatedPoint> {
        self.buckets.values().copied().collect()
    }

    /// Snapshot copy of bucket means, oldest first.
    pub fn prices(&self) -> Vec<f64> {
        self.buckets.values().map(|p| p.mean_price).collect()
    }

    pub fn latest(&self) -> Option<&AggregatedPoint> {
        self.buckets.values().next_back()
    }

    pub fn version(&self) -> Option<SeriesVersion> {
        self.latest().map(|p| SeriesVersion {
            latest_bucket: p.bucket_start,
            len: self.buckets.len(),
        })
    }
}

/// Owns the hourly and daily series. Single writer; readers take snapshots.
#[derive(Debug, Clone)]
pub struct SeriesAggregator {
    hourly: BucketSeries,
    daily: BucketSeries,
}

impl Default for SeriesAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesAggregator {
    pub fn new() -> Self {
        Self {
            hourly: BucketSeries::new(Granularity::Hourly),
            daily: BucketSeries::new(Granularity::Daily),
        }
    }

    /// Bulk build from a full historical sample set.
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a PriceSample>) -> Self {
        let mut agg = Self::new();
        let mut count = 0usize;
        for sample in samples {
            agg.add_sample(sample);
            count += 1;
        }
        tracing::info!(
            samples = count,
            hourly = agg.hourly.len(),
            daily = agg.daily.len(),
            "Aggregated price history"
        );
        agg
    }

    /// Incremental add of one live sample into both series.
    pub fn add_sample(&mut self, sample: &PriceSample) {
        self.hourly.add(sample);
        self.daily.add(sample);
    }

    pub fn hourly(&self) -> &BucketSeries {
        &self.hourly
    }

    pub fn daily(&self) -> &BucketSeries {
        &self.daily
    }

    pub fn for_horizon(&self, horizon: &Horizon) -> &BucketSeries {
        match horizon.granularity {
            Granularity::Daily => &self.daily,
            Granularity::Hourly | Granularity::FiveMinutes => &self.hourly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(y: i32, mo: u32, d: u32, h: u32, mi: u32, price: f64) -> PriceSample {
        PriceSample::new(Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap(), price).unwrap()
    }

    #[test]
    fn same_hour_samples_share_a_bucket() {
        let samples = [
            sample(2024, 1, 1, 0, 59, 100.0),
            sample(2024, 1, 1, 0, 1, 200.0),
        ];
        let agg = SeriesAggregator::from_samples(&samples);
        let hourly = agg.hourly().points();
        assert_eq!(hourly.len(), 1);
        assert_eq!(
            hourly[0].key(Granularity::Hourly),
            "2024-01-01T00:00:00Z"
        );
        assert!((hourly[0].mean_price - 150.0).abs() < 1e-12);
        assert_eq!(agg.daily().len(), 1);
    }

    #[test]
    fn out_of_order_samples_come_out_sorted() {
        let samples = [
            sample(2024, 1, 3, 5, 0, 3.0),
            sample(2024, 1, 1, 5, 0, 1.0),
            sample(2024, 1, 2, 5, 0, 2.0),
        ];
        let agg = SeriesAggregator::from_samples(&samples);
        assert_eq!(agg.daily().prices(), vec![1.0, 2.0, 3.0]);
        let keys: Vec<String> = agg
            .daily()
            .points()
            .iter()
            .map(|p| p.key(Granularity::Daily))
            .collect();
        assert_eq!(keys, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn incremental_add_updates_or_inserts() {
        let mut agg = SeriesAggregator::from_samples(&[sample(2024, 1, 1, 10, 0, 100.0)]);
        agg.add_sample(&sample(2024, 1, 1, 10, 30, 110.0));
        assert_eq!(agg.hourly().len(), 1);
        assert!((agg.hourly().prices()[0] - 105.0).abs() < 1e-12);

        agg.add_sample(&sample(2024, 1, 1, 11, 5, 120.0));
        assert_eq!(agg.hourly().len(), 2);
        assert_eq!(agg.daily().len(), 1);
        assert!((agg.daily().prices()[0] - 110.0).abs() < 1e-12);

        // a late sample lands in its own earlier bucket
        agg.add_sample(&sample(2024, 1, 1, 9, 0, 90.0));
        assert_eq!(agg.hourly().prices(), vec![90.0, 105.0, 120.0]);
    }

    #[test]
    fn version_tracks_latest_bucket() {
        let mut agg = SeriesAggregator::new();
        assert_eq!(agg.hourly().version(), None);
        agg.add_sample(&sample(2024, 1, 1, 10, 0, 100.0));
        let v1 = agg.hourly().version().unwrap();
        agg.add_sample(&sample(2024, 1, 1, 10, 40, 101.0));
        assert_eq!(agg.hourly().version().unwrap(), v1);
        agg.add_sample(&sample(2024, 1, 1, 11, 0, 102.0));
        let v2 = agg.hourly().version().unwrap();
        assert_ne!(v1, v2);
        assert_eq!(v2.len, 2);
    }
}

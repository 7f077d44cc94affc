use chrono::{TimeZone, Utc};

use price_gauge::aggregator::SeriesAggregator;
use price_gauge::model::{Granularity, PriceSample, HORIZON_30D, HORIZON_365D};

fn at(d: u32, h: u32, mi: u32, price: f64) -> PriceSample {
    PriceSample::new(Utc.with_ymd_and_hms(2024, 1, d, h, mi, 0).unwrap(), price).unwrap()
}

#[test]
fn samples_in_one_hour_are_averaged_into_one_bucket() {
    let agg = SeriesAggregator::from_samples(&[at(1, 0, 59, 100.0), at(1, 0, 1, 200.0)]);
    let hourly = agg.hourly().points();
    assert_eq!(hourly.len(), 1);
    assert_eq!(hourly[0].key(Granularity::Hourly), "2024-01-01T00:00:00Z");
    assert!((hourly[0].mean_price - 150.0).abs() < 1e-12);
    assert_eq!(hourly[0].sample_count, 2);
}

#[test]
fn bucket_starts_are_unique_and_increasing() {
    let samples: Vec<PriceSample> = (0..96)
        .rev()
        .map(|i| at(1 + i / 24, i % 24, 30, 100.0 + i as f64))
        .collect();
    let agg = SeriesAggregator::from_samples(&samples);
    let hourly = agg.hourly().points();
    assert_eq!(hourly.len(), 96);
    assert!(hourly.windows(2).all(|w| w[0].bucket_start < w[1].bucket_start));
    assert_eq!(agg.daily().len(), 4);
}

#[test]
fn horizon_selects_the_matching_series() {
    let agg = SeriesAggregator::from_samples(&[at(1, 1, 0, 1.0), at(1, 2, 0, 3.0)]);
    assert_eq!(agg.for_horizon(&HORIZON_30D).len(), 2);
    assert_eq!(agg.for_horizon(&HORIZON_365D).len(), 1);
    assert!((agg.for_horizon(&HORIZON_365D).prices()[0] - 2.0).abs() < 1e-12);
}

#[test]
fn invalid_samples_are_rejected_before_aggregation() {
    let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert!(PriceSample::new(t, 0.0).is_err());
    assert!(PriceSample::new(t, -1.0).is_err());
    assert!(PriceSample::new(t, f64::NAN).is_err());
    assert!(PriceSample::new(t, f64::INFINITY).is_err());
}

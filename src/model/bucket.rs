use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Calendar alignment of an aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    FiveMinutes,
    Hourly,
    Daily,
}

impl Granularity {
    pub fn step(self) -> TimeDelta {
        match self {
            Self::FiveMinutes => TimeDelta::minutes(5),
            Self::Hourly => TimeDelta::hours(1),
            Self::Daily => TimeDelta::days(1),
        }
    }

    /// Truncate `ts` to the start of its UTC bucket.
    pub fn bucket_start(self, ts: DateTime<Utc>) -> DateTime<Utc> {
        ts.duration_trunc(self.step()).unwrap_or(ts)
    }

    /// ISO key of the bucket: `YYYY-MM-DD` for days, `YYYY-MM-DDTHH:MM:00Z` otherwise.
    /// Lexicographic order of keys equals chronological order.
    pub fn bucket_key(self, ts: DateTime<Utc>) -> String {
        format_key(self, self.bucket_start(ts))
    }
}

pub fn format_key(granularity: Granularity, start: DateTime<Utc>) -> String {
    match granularity {
        Granularity::Daily => start.format("%Y-%m-%d").to_string(),
        Granularity::Hourly | Granularity::FiveMinutes => {
            start.format("%Y-%m-%dT%H:%M:00Z").to_string()
        }
    }
}

/// Mean price of every sample that fell into one bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedPoint {
    pub bucket_start: DateTime<Utc>,
    pub mean_price: f64,
    pub sample_count: u64,
}

impl AggregatedPoint {
    pub fn new(bucket_start: DateTime<Utc>, price: f64) -> Self {
        Self {
            bucket_start,
            mean_price: price,
            sample_count: 1,
        }
    }

    /// Fold one more sample into the running mean.
    pub fn add(&mut self, price: f64) {
        self.sample_count += 1;
        self.mean_price += (price - self.mean_price) / self.sample_count as f64;
    }

    pub fn key(&self, granularity: Granularity) -> String {
        format_key(granularity, self.bucket_start)
    }
}

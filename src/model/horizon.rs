use super::bucket::Granularity;

/// Lookback scope of one price multiple: `window_length` prior buckets of `granularity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Horizon {
    pub key: &'static str,
    pub window_length: usize,
    pub granularity: Granularity,
}

pub const HORIZON_365D: Horizon = Horizon {
    key: "365d",
    window_length: 365,
    granularity: Granularity::Daily,
};

pub const HORIZON_30D: Horizon = Horizon {
    key: "30d",
    window_length: 30 * 24,
    granularity: Granularity::Hourly,
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::label::{Label, LabelTone};

/// Price multiple of one horizon as seen "now". Undefined statistics are NaN and
/// serialize as JSON `null`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceMultiple {
    pub multiple: f64,
    /// Fraction in `[0, 1]`.
    pub percentile: f64,
    /// Percent in `[0, 100]`.
    pub vol_adj_percentile: f64,
    pub higher_than_percent: f64,
    pub label: Label,
    /// Colour band of `label` for the dashboard legend.
    pub tone: LabelTone,
    pub sma: f64,
    #[serde(rename = "smaAsOfUTC")]
    pub sma_as_of_utc: DateTime<Utc>,
    pub sample_size: usize,
    pub historical_average: f64,
    pub count_higher_in_window: usize,
    pub window_length: usize,
}

impl PriceMultiple {
    /// Result for too little history or a non-positive trailing mean.
    pub fn degenerate(sample_size: usize, window_length: usize, now: DateTime<Utc>) -> Self {
        Self {
            multiple: f64::NAN,
            percentile: f64::NAN,
            vol_adj_percentile: f64::NAN,
            higher_than_percent: f64::NAN,
            label: Label::AroundAverage,
            tone: Label::AroundAverage.tone(),
            sma: f64::NAN,
            sma_as_of_utc: now,
            sample_size,
            historical_average: f64::NAN,
            count_higher_in_window: 0,
            window_length,
        }
    }
}

/// One bucket of the charted history. Percentiles are percent in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub t: DateTime<Utc>,
    pub price: f64,
    pub sma: Option<f64>,
    pub multiple: Option<f64>,
    pub percentile: Option<f64>,
    pub vol_adj_percentile: Option<f64>,
}

/// One value per horizon, keyed the way the dashboard reads it.
#[derive(Debug, Clone, Serialize)]
pub struct HorizonPair<T> {
    #[serde(rename = "365d")]
    pub long: T,
    #[serde(rename = "30d")]
    pub short: T,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(rename = "asOfUTC")]
    pub as_of_utc: DateTime<Utc>,
    #[serde(rename = "currentPriceUSD")]
    pub current_price_usd: f64,
    pub price_source: String,
    #[serde(rename = "priceAsOfUTC")]
    pub price_as_of_utc: DateTime<Utc>,
    pub horizons: HorizonPair<PriceMultiple>,
}

#[derive(Debug, Clone, Serialize)]
pub struct History {
    pub horizons: HorizonPair<Vec<HistoryPoint>>,
}

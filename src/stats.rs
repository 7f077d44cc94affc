//! Shared statistics primitives for the live and batch ranking paths.
//!
//! Ties land in the `<=` bucket of `percentile_of`; `higher_than_percent` counts
//! strictly greater values. Labels are derived from `percentile_of` only.

/// Winsorization bounds in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinsorBounds {
    pub lower_pct: f64,
    pub upper_pct: f64,
}

impl Default for WinsorBounds {
    fn default() -> Self {
        Self {
            lower_pct: 1.0,
            upper_pct: 99.0,
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Clamp every value (original order kept) to
/// `[sorted[floor(lo * n)], sorted[ceil(hi * n) - 1]]`.
pub fn winsorize(values: &[f64], bounds: WinsorBounds) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let lower_index = ((bounds.lower_pct / 100.0 * n as f64).floor() as usize).min(n - 1);
    let upper_index = ((bounds.upper_pct / 100.0 * n as f64).ceil() as usize)
        .saturating_sub(1)
        .clamp(lower_index, n - 1);
    let lo = sorted[lower_index];
    let hi = sorted[upper_index];

    values.iter().map(|v| v.clamp(lo, hi)).collect()
}

/// Fraction of `distribution` that is `<= value`. NaN on an empty distribution.
pub fn percentile_of(value: f64, distribution: &[f64]) -> f64 {
    if distribution.is_empty() {
        return f64::NAN;
    }
    let count = distribution.iter().filter(|x| **x <= value).count();
    count as f64 / distribution.len() as f64
}

/// Fraction of `distribution` that is strictly `> value`. NaN on an empty distribution.
pub fn higher_than_percent(value: f64, distribution: &[f64]) -> f64 {
    if distribution.is_empty() {
        return f64::NAN;
    }
    let count = distribution.iter().filter(|x| **x > value).count();
    count as f64 / distribution.len() as f64
}

/// A winsorized distribution kept sorted, so repeated ranking is `O(log n)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedDistribution {
    sorted: Vec<f64>,
    mean: f64,
}

impl RankedDistribution {
    pub fn winsorized(values: &[f64], bounds: WinsorBounds) -> Self {
        let mut sorted = winsorize(values, bounds);
        let mean = mean(&sorted);
        sorted.sort_by(|a, b| a.total_cmp(b));
        Self { sorted, mean }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Mean of the winsorized values.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn percentile_of(&self, value: f64) -> f64 {
        if self.sorted.is_empty() {
            return f64::NAN;
        }
        let count = self.sorted.partition_point(|x| *x <= value);
        count as f64 / self.sorted.len() as f64
    }

    pub fn higher_than_percent(&self, value: f64) -> f64 {
        if self.sorted.is_empty() {
            return f64::NAN;
        }
        let at_or_below = self.sorted.partition_point(|x| *x <= value);
        (self.sorted.len() - at_or_below) as f64 / self.sorted.len() as f64
    }
}

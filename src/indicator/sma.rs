/// Mean of the last `period` values. NaN when fewer than `period` values exist
/// (no partial-window averaging) or when `period` is zero.
pub fn sma(values: &[f64], period: usize) -> f64 {
    if period == 0 || values.len() < period {
        return f64::NAN;
    }
    values[values.len() - period..].iter().sum::<f64>() / period as f64
}

/// Prior-window SMA over a ring buffer, advanced one bucket at a time.
///
/// Each [`advance`](Self::advance) reports the mean of the `window` values seen
/// before the new one and only then folds the new value in, so a bucket is never
/// averaged into its own baseline.
#[derive(Debug, Clone)]
pub struct TrailingSma {
    window: usize,
    ring: Vec<f64>,
    head: usize,
    filled: usize,
    sum: f64,
}

impl TrailingSma {
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "SMA window must be > 0");
        Self {
            window,
            ring: vec![0.0; window],
            head: 0,
            filled: 0,
            sum: 0.0,
        }
    }

    /// Mean of the last `window` values, `None` until the ring is full.
    pub fn value(&self) -> Option<f64> {
        (self.filled == self.window).then(|| self.sum / self.window as f64)
    }

    /// Return the SMA preceding `value`, then take `value` into the window.
    pub fn advance(&mut self, value: f64) -> Option<f64> {
        let prior = self.value();
        if self.filled == self.window {
            self.sum -= self.ring[self.head];
        } else {
            self.filled += 1;
        }
        self.ring[self.head] = value;
        self.sum += value;
        self.head = (self.head + 1) % self.window;
        prior
    }
}

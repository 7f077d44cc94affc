use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One observed USD price at a UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PriceSample {
    /// Build a sample, rejecting non-finite and non-positive prices.
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Result<Self, AppError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(AppError::InvalidSample(format!(
                "price must be finite and > 0, got {}",
                price
            )));
        }
        Ok(Self { timestamp, price })
    }

    pub fn now(price: f64) -> Result<Self, AppError> {
        Self::new(Utc::now(), price)
    }
}

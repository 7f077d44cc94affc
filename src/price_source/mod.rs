pub mod bullbitcoin;

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::model::PriceSample;

pub use bullbitcoin::BullBitcoinClient;

/// Anything that can produce one live price sample per call.
pub trait PriceSource: Send + Sync {
    fn fetch_price(&self) -> impl Future<Output = Result<PriceSample, AppError>> + Send;
}

/// Linear backoff: failure `k` waits `k * backoff` before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        self.backoff * failed_attempt
    }
}

pub async fn fetch_with_retry<S: PriceSource>(
    source: &S,
    policy: &RetryPolicy,
) -> Result<PriceSample, AppError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match source.fetch_price().await {
            Ok(sample) => return Ok(sample),
            Err(e) if attempt >= max_attempts => {
                tracing::error!(attempt, error = %e, "Price fetch failed, giving up");
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Price fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// A sample handed out by [`PriceFeed`]. Only `fresh` samples are new observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedSample {
    pub sample: PriceSample,
    pub fresh: bool,
}

/// Price source with retries and a last-known-sample cache.
pub struct PriceFeed<S> {
    source: S,
    policy: RetryPolicy,
    ttl: Duration,
    last: Mutex<Option<(PriceSample, Instant)>>,
}

impl<S: PriceSource> PriceFeed<S> {
    pub fn new(source: S, policy: RetryPolicy, ttl: Duration) -> Self {
        Self {
            source,
            policy,
            ttl,
            last: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<(PriceSample, Instant)> {
        *self.last.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A cached sample younger than the TTL, else a fetched one. When every
    /// attempt fails the last known sample is served, however old.
    pub async fn current(&self) -> Result<FeedSample, AppError> {
        if let Some((sample, at)) = self.cached() {
            if at.elapsed() < self.ttl {
                return Ok(FeedSample {
                    sample,
                    fresh: false,
                });
            }
        }

        match fetch_with_retry(&self.source, &self.policy).await {
            Ok(sample) => {
                *self.last.lock().unwrap_or_else(|e| e.into_inner()) =
                    Some((sample, Instant::now()));
                Ok(FeedSample {
                    sample,
                    fresh: true,
                })
            }
            Err(e) => match self.cached() {
                Some((sample, at)) => {
                    tracing::warn!(
                        age_secs = at.elapsed().as_secs(),
                        error = %e,
                        "Serving last known price after fetch failure"
                    );
                    Ok(FeedSample {
                        sample,
                        fresh: false,
                    })
                }
                None => Err(e),
            },
        }
    }
}

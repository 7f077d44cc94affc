use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::model::PriceSample;

use super::PriceSource;

/// Bull Bitcoin index rate over its JSON-RPC price endpoint.
pub struct BullBitcoinClient {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Serialize)]
struct RateRequest<'a> {
    id: &'a str,
    jsonrpc: &'a str,
    method: &'a str,
    params: RateParams<'a>,
}

#[derive(Debug, Serialize)]
struct RateParams<'a> {
    element: CurrencyPair<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyPair<'a> {
    from_currency: &'a str,
    to_currency: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RateResponse {
    #[serde(default)]
    result: Option<RateResult>,
}

#[derive(Debug, Deserialize)]
struct RateResult {
    #[serde(default)]
    element: Option<RateElement>,
}

#[derive(Debug, Deserialize)]
struct RateElement {
    #[serde(default)]
    price: Option<serde_json::Value>,
}

impl RateResponse {
    /// USD price; the endpoint quotes cents.
    pub fn price_usd(&self) -> Result<f64, AppError> {
        let cents = self
            .result
            .as_ref()
            .and_then(|r| r.element.as_ref())
            .and_then(|e| e.price.as_ref())
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| AppError::PriceFetch("rate response has no numeric price".to_string()))?;
        if cents == 0.0 {
            return Err(AppError::PriceFetch("rate response price is zero".to_string()));
        }
        Ok(cents / 100.0)
    }
}

impl BullBitcoinClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    async fn fetch(&self) -> Result<PriceSample, AppError> {
        let body = RateRequest {
            id: "bitcoin-price-gauge",
            jsonrpc: "2.0",
            method: "getUserRate",
            params: RateParams {
                element: CurrencyPair {
                    from_currency: "BTC",
                    to_currency: "USD",
                },
            },
        };

        let resp: RateResponse = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let sample = PriceSample::now(resp.price_usd()?)?;
        tracing::debug!(price = sample.price, "Fetched live price");
        Ok(sample)
    }
}

impl PriceSource for BullBitcoinClient {
    async fn fetch_price(&self) -> Result<PriceSample, AppError> {
        self.fetch().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_is_converted_from_cents() {
        let resp: RateResponse =
            serde_json::from_str(r#"{"result":{"element":{"price":6543210}}}"#).unwrap();
        assert!((resp.price_usd().unwrap() - 65_432.10).abs() < 1e-9);
    }

    #[test]
    fn missing_or_non_numeric_price_is_an_error() {
        for body in [
            r#"{}"#,
            r#"{"result":{}}"#,
            r#"{"result":{"element":{"price":"12"}}}"#,
            r#"{"result":{"element":{"price":0}}}"#,
        ] {
            let resp: RateResponse = serde_json::from_str(body).unwrap();
            assert!(resp.price_usd().is_err(), "accepted {}", body);
        }
    }

    #[test]
    fn request_body_matches_rpc_shape() {
        let body = RateRequest {
            id: "x",
            jsonrpc: "2.0",
            method: "getUserRate",
            params: RateParams {
                element: CurrencyPair {
                    from_currency: "BTC",
                    to_currency: "USD",
                },
            },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["params"]["element"]["fromCurrency"], "BTC");
        assert_eq!(v["params"]["element"]["toCurrency"], "USD");
        assert_eq!(v["method"], "getUserRate");
    }
}

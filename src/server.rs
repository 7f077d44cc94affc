use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::aggregator::SeriesAggregator;
use crate::analysis::{compute_history, HorizonAnalyzer, SeriesSnapshot};
use crate::error::AppError;
use crate::model::{History, HorizonPair, Summary, HORIZON_30D, HORIZON_365D};
use crate::price_source::{PriceFeed, PriceSource};
use crate::store::load_history_table;

pub const SERVICE_NAME: &str = "bitcoin-price-gauge";

/// Where `/api/history` gets its rows.
#[derive(Debug, Clone)]
pub enum HistorySource {
    /// Recomputed from the aggregator on every request.
    Computed,
    /// Tables written by `precompute-history`, served verbatim.
    Precomputed(Arc<History>),
}

impl HistorySource {
    /// Precomputed when both tables exist, otherwise computed on demand.
    pub fn from_tables(daily: &Path, hourly: &Path) -> Result<Self> {
        match (load_history_table(daily)?, load_history_table(hourly)?) {
            (Some(long), Some(short)) => Ok(Self::Precomputed(Arc::new(History {
                horizons: HorizonPair { long, short },
            }))),
            _ => {
                tracing::info!("Precomputed history not found, computing on demand");
                Ok(Self::Computed)
            }
        }
    }
}

pub struct AppState<S> {
    pub aggregator: RwLock<SeriesAggregator>,
    pub analyzer: HorizonAnalyzer,
    pub feed: PriceFeed<S>,
    pub source_label: String,
    pub history: HistorySource,
}

impl<S: PriceSource> AppState<S> {
    pub fn new(
        aggregator: SeriesAggregator,
        analyzer: HorizonAnalyzer,
        feed: PriceFeed<S>,
        source_label: impl Into<String>,
        history: HistorySource,
    ) -> Self {
        Self {
            aggregator: RwLock::new(aggregator),
            analyzer,
            feed,
            source_label: source_label.into(),
            history,
        }
    }

    async fn snapshots(&self) -> (SeriesSnapshot, SeriesSnapshot) {
        let aggregator = self.aggregator.read().await;
        (
            SeriesSnapshot::take(&aggregator, HORIZON_365D),
            SeriesSnapshot::take(&aggregator, HORIZON_30D),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub service: &'static str,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal_error(error: &str, message: impl ToString) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        }),
    )
}

impl From<AppError> for ErrorResponse {
    fn from(e: AppError) -> Self {
        let error = match e {
            AppError::PriceFetch(_) | AppError::Http(_) | AppError::InvalidSample(_) => {
                "PRICE_FETCH_ERROR"
            }
            _ => "INTERNAL_ERROR",
        };
        Self {
            error: error.to_string(),
            message: e.to_string(),
        }
    }
}

pub fn router<S: PriceSource + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/api/summary", get(summary::<S>))
        .route("/api/history", get(history::<S>))
        .route("/api/health", get(health))
        .with_state(state)
}

async fn summary<S: PriceSource + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Summary>, ApiError> {
    let feed_sample = state.feed.current().await.map_err(|e| {
        tracing::error!(error = %e, "Summary request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::from(e)))
    })?;

    if feed_sample.fresh {
        state
            .aggregator
            .write()
            .await
            .add_sample(&feed_sample.sample);
    }

    let (daily, hourly) = state.snapshots().await;
    let worker = Arc::clone(&state);
    let summary = tokio::task::spawn_blocking(move || {
        worker.analyzer.summarize(
            &feed_sample.sample,
            &worker.source_label,
            &daily,
            &hourly,
            Utc::now(),
        )
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Summary analysis failed");
        internal_error("INTERNAL_ERROR", e)
    })?;
    tracing::debug!(
        price = summary.current_price_usd,
        fresh = feed_sample.fresh,
        "Served summary"
    );
    Ok(Json(summary))
}

async fn history<S: PriceSource>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<History>, ApiError> {
    match &state.history {
        HistorySource::Precomputed(history) => Ok(Json(History::clone(history))),
        HistorySource::Computed => {
            let (daily, hourly) = state.snapshots().await;
            let params = *state.analyzer.params();
            let history =
                tokio::task::spawn_blocking(move || compute_history(&daily, &hourly, &params))
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "History computation failed");
                        internal_error("INTERNAL_ERROR", e)
                    })?;
            Ok(Json(history))
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        service: SERVICE_NAME,
    })
}

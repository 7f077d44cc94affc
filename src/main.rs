use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use price_gauge::aggregator::SeriesAggregator;
use price_gauge::analysis::HorizonAnalyzer;
use price_gauge::config::Config;
use price_gauge::price_source::{BullBitcoinClient, PriceFeed};
use price_gauge::server::{self, AppState, HistorySource};
use price_gauge::store::load_bootstrap;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Check config/default.toml and the PORT variable");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_ansi(false)
        .json()
        .init();

    tracing::info!(
        bind_addr = %config.server.bind_addr,
        price_url = %config.price_source.url,
        bootstrap = %config.data.bootstrap_path,
        "Starting price gauge"
    );

    let bootstrap = load_bootstrap(Path::new(&config.data.bootstrap_path))?;
    let aggregator = SeriesAggregator::from_samples(&bootstrap.samples);

    let history = HistorySource::from_tables(
        Path::new(&config.data.history_daily_path),
        Path::new(&config.data.history_hourly_path),
    )?;

    let client = BullBitcoinClient::new(&config.price_source.url, config.price_source.timeout())?;
    let feed = PriceFeed::new(
        client,
        config.price_source.retry_policy(),
        config.price_source.cache_ttl(),
    );
    let analyzer = HorizonAnalyzer::new(config.analysis.ranking_params()?);

    let state = Arc::new(AppState::new(
        aggregator,
        analyzer,
        feed,
        config.price_source.source_label.clone(),
        history,
    ));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(addr = %config.server.bind_addr, "Listening");

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

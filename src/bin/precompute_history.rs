use std::path::PathBuf;

use anyhow::Result;

use price_gauge::aggregator::SeriesAggregator;
use price_gauge::analysis::{compute_history, SeriesSnapshot};
use price_gauge::config::Config;
use price_gauge::model::{Granularity, HORIZON_30D, HORIZON_365D};
use price_gauge::store::{load_bootstrap, save_history_table};

const DEFAULT_INPUT: &str = "data/bootstrap_10min.csv";
const DEFAULT_OUT_DAILY: &str = "data/history_365d.csv";
const DEFAULT_OUT_HOURLY: &str = "data/history_30d_hourly.csv";

/// `precompute-history [input] [out-daily] [out-hourly]`
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let input = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_INPUT.to_string()));
    let out_daily = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_OUT_DAILY.to_string()));
    let out_hourly = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_OUT_HOURLY.to_string()));

    let config = Config::load()?;
    let params = config.analysis.ranking_params()?;

    let bootstrap = load_bootstrap(&input)?;
    if bootstrap.samples.is_empty() {
        anyhow::bail!("no usable samples in {}", input.display());
    }
    let aggregator = SeriesAggregator::from_samples(&bootstrap.samples);
    let daily = SeriesSnapshot::take(&aggregator, HORIZON_365D);
    let hourly = SeriesSnapshot::take(&aggregator, HORIZON_30D);

    let history = compute_history(&daily, &hourly, &params);
    save_history_table(&out_daily, &history.horizons.long, Granularity::Daily)?;
    save_history_table(&out_hourly, &history.horizons.short, Granularity::Hourly)?;

    println!(
        "wrote {} daily rows to {} and {} hourly rows to {}",
        history.horizons.long.len(),
        out_daily.display(),
        history.horizons.short.len(),
        out_hourly.display()
    );
    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::SecondsFormat;

use price_gauge::aggregator::BucketSeries;
use price_gauge::model::Granularity;
use price_gauge::store::load_bootstrap;

const DEFAULT_INPUT: &str = "data/bootstrap.csv";
const DEFAULT_OUTPUT: &str = "data/bootstrap_5min.csv";

/// `downsample [input] [output]`: 5-minute bucket means as `time,price`.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let input = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_INPUT.to_string()));
    let output = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string()));

    let load = load_bootstrap(&input)?;
    let mut series = BucketSeries::new(Granularity::FiveMinutes);
    for sample in &load.samples {
        series.add(sample);
    }

    let mut wtr = csv::Writer::from_path(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    wtr.write_record(["time", "price"])?;
    for point in series.points() {
        wtr.write_record([
            point
                .bucket_start
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            format!("{:.2}", point.mean_price),
        ])?;
    }
    wtr.flush()?;

    println!(
        "downsampled {} samples into {} buckets ({} rows skipped) -> {}",
        load.samples.len(),
        series.len(),
        load.skipped,
        output.display()
    );
    Ok(())
}

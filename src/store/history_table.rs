use std::io::{Read, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::model::bucket::format_key;
use crate::model::{Granularity, HistoryPoint};

use super::bootstrap::parse_timestamp;

#[derive(Debug, Serialize)]
struct HistoryRowOut {
    time: String,
    price: String,
    sma: Option<f64>,
    multiple: Option<f64>,
    percentile: Option<f64>,
    vol_adj_percentile: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HistoryRowIn {
    #[serde(alias = "date", alias = "datetime")]
    time: String,
    price: f64,
    sma: Option<f64>,
    multiple: Option<f64>,
    percentile: Option<f64>,
    #[serde(rename = "volAdjPercentile", default)]
    vol_adj_percentile: Option<f64>,
}

fn time_column(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Daily => "date",
        Granularity::Hourly | Granularity::FiveMinutes => "datetime",
    }
}

/// Write one precomputed history table. Undefined fields are empty cells.
pub fn write_history_table<W: Write>(
    writer: W,
    points: &[HistoryPoint],
    granularity: Granularity,
) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record([
        time_column(granularity),
        "price",
        "sma",
        "multiple",
        "percentile",
        "volAdjPercentile",
    ])?;
    for p in points {
        wtr.serialize(HistoryRowOut {
            time: format_key(granularity, p.t),
            price: format!("{:.2}", p.price),
            sma: p.sma,
            multiple: p.multiple,
            percentile: p.percentile,
            vol_adj_percentile: p.vol_adj_percentile,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a precomputed table written by [`write_history_table`] (either header).
pub fn read_history_table<R: Read>(reader: R) -> Result<Vec<HistoryPoint>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut points = Vec::new();
    for (index, row) in rdr.deserialize::<HistoryRowIn>().enumerate() {
        let row = row.with_context(|| format!("bad history row {}", index + 2))?;
        let t = parse_timestamp(&row.time)
            .ok_or_else(|| anyhow!("bad history time '{}' at row {}", row.time, index + 2))?;
        points.push(HistoryPoint {
            t,
            price: row.price,
            sma: row.sma,
            multiple: row.multiple,
            percentile: row.percentile,
            vol_adj_percentile: row.vol_adj_percentile,
        });
    }
    Ok(points)
}

pub fn save_history_table(
    path: &Path,
    points: &[HistoryPoint],
    granularity: Granularity,
) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_history_table(std::io::BufWriter::new(file), points, granularity)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = points.len(), "Wrote history table");
    Ok(())
}

/// `Ok(None)` when the table has not been precomputed.
pub fn load_history_table(path: &Path) -> Result<Option<Vec<HistoryPoint>>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let points = read_history_table(std::io::BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = points.len(), "Loaded precomputed history");
    Ok(Some(points))
}

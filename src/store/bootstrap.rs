use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, Trim};

use crate::model::PriceSample;

/// Epoch values above this are milliseconds, otherwise seconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

#[derive(Debug, Clone, Default)]
pub struct BootstrapLoad {
    pub samples: Vec<PriceSample>,
    pub skipped: usize,
}

/// Parse an ISO-8601 / RFC 3339 instant or a Unix epoch number (seconds, or
/// milliseconds when larger than `1e12`). Zone-less text is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if is_epoch_number(s) {
        let value: f64 = s.parse().ok()?;
        let millis = if value > EPOCH_MILLIS_THRESHOLD {
            value
        } else {
            value * 1000.0
        };
        return DateTime::from_timestamp_millis(millis.trunc() as i64);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn is_epoch_number(s: &str) -> bool {
    let mut parts = s.splitn(2, '.');
    let int_part = parts.next().unwrap_or_default();
    let frac_part = parts.next().unwrap_or_default();
    !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit())
}

/// Read `time,price` rows. The header is optional; bad rows are skipped with a warning.
pub fn read_bootstrap<R: Read>(reader: R) -> BootstrapLoad {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut load = BootstrapLoad::default();
    for (index, record) in rdr.records().enumerate() {
        let line = index + 1;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line, error = %e, "Skipping unreadable bootstrap row");
                load.skipped += 1;
                continue;
            }
        };

        let time = record.get(0).unwrap_or_default();
        let price = record.get(1).unwrap_or_default();
        if index == 0 && time.eq_ignore_ascii_case("time") {
            continue;
        }
        if time.is_empty() && price.is_empty() {
            continue;
        }

        let Some(timestamp) = parse_timestamp(time) else {
            tracing::warn!(line, time, "Skipping bootstrap row with invalid timestamp");
            load.skipped += 1;
            continue;
        };
        let sample = price
            .parse::<f64>()
            .ok()
            .and_then(|p| PriceSample::new(timestamp, p).ok());
        match sample {
            Some(s) => load.samples.push(s),
            None => {
                tracing::warn!(line, price, "Skipping bootstrap row with invalid price");
                load.skipped += 1;
            }
        }
    }
    load
}

/// Load the bootstrap CSV. A missing file is an empty history, not an error.
pub fn load_bootstrap(path: &Path) -> Result<BootstrapLoad> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "No bootstrap CSV, history starts empty");
        return Ok(BootstrapLoad::default());
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let load = read_bootstrap(std::io::BufReader::new(file));
    tracing::info!(
        path = %path.display(),
        samples = load.samples.len(),
        skipped = load.skipped,
        "Loaded bootstrap price history"
    );
    Ok(load)
}

//! Reads the long-format price file into `PriceRecord`s.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use core_types::PriceRecord;
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Column order assumed when the file has no header row.
const DEFAULT_COLUMNS: [&str; 6] = [
    "symbol",
    "date",
    "close",
    "index_type",
    "index_category",
    "index_name",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct CsvRow {
    symbol: String,
    date: String,
    close: Option<f64>,
    #[serde(default)]
    index_type: Option<String>,
    #[serde(default)]
    index_category: Option<String>,
    #[serde(default)]
    index_name: Option<String>,
}

/// Loads price records from a CSV file.
///
/// `symbol`, `date` and `close` are required; the three tag columns are
/// optional. Any other column holding numbers is kept in `PriceRecord::extra`
/// so it can be pivoted instead of `close`. A blank close is kept as a missing
/// price rather than rejected.
pub fn load_price_csv(path: impl AsRef<Path>, has_headers: bool) -> Result<Vec<PriceRecord>> {
    let path = path.as_ref();
    info!("Loading prices from: {}", path.display());

    let mut reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open price file {}", path.display()))?;

    let headers = if has_headers {
        let headers = reader.headers()?.clone();
        for required in &DEFAULT_COLUMNS[..3] {
            if !headers.iter().any(|h| h == *required) {
                bail!("Price file {} has no '{}' column", path.display(), required);
            }
        }
        Some(headers)
    } else {
        None
    };

    let mut records = Vec::new();
    let mut blank_closes = 0usize;
    for (row_num, result) in reader.records().enumerate() {
        let line = row_num + if has_headers { 2 } else { 1 };
        let raw = result.with_context(|| format!("Malformed CSV at line {line}"))?;
        let positional;
        let headers = match &headers {
            Some(h) => h,
            None => {
                positional = StringRecord::from(&DEFAULT_COLUMNS[..raw.len().min(DEFAULT_COLUMNS.len())]);
                &positional
            }
        };

        let row: CsvRow = raw
            .deserialize(Some(headers))
            .with_context(|| format!("Invalid price row at line {line}"))?;
        let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
            .with_context(|| format!("Invalid date '{}' at line {line}", row.date))?;
        if row.close.is_none() {
            blank_closes += 1;
        }

        let mut record = PriceRecord::new(row.symbol, date, row.close.unwrap_or(f64::NAN));
        record.index_type = row.index_type;
        record.index_category = row.index_category;
        record.index_name = row.index_name;
        for (name, value) in headers.iter().zip(raw.iter()) {
            if DEFAULT_COLUMNS.contains(&name) {
                continue;
            }
            if let Ok(number) = value.parse::<f64>() {
                record = record.with_field(name, number);
            }
        }
        records.push(record);
    }

    if blank_closes > 0 {
        warn!("{} rows have no close price", blank_closes);
    }
    debug!(rows = records.len(), "parsed price file");
    info!(
        "Loaded {} price records from {} to {}",
        records.len(),
        records.iter().map(|r| r.date).min().map(|d| d.to_string()).unwrap_or_default(),
        records.iter().map(|r| r.date).max().map(|d| d.to_string()).unwrap_or_default()
    );

    Ok(records)
}

//! Price sources
//!
//! The fetch collaborator the pipeline reads from, plus symbol resolution for
//! index tickers. Sources are blocking; the analytics themselves do no I/O.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, info};

use crate::error::FetchError;
use crate::normalize::{inception_floor, parse_date};
use crate::types::RawPriceRecord;

/// Index tickers that are quoted with a `^` prefix
pub const INDEX_TICKERS: &[&str] = &["GSPC", "DJI", "IXIC", "RUT", "VIX"];

/// Supplies raw daily records for a symbol.
pub trait PriceSource {
    /// Records for `symbol` dated on or after `start`, if given.
    fn fetch(&self, symbol: &str, start: Option<NaiveDate>) -> Result<Vec<RawPriceRecord>, FetchError>;
}

/// Records together with the symbol that actually produced them
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedSeries {
    pub symbol: String,
    pub records: Vec<RawPriceRecord>,
}

/// Canonical form of a user-entered symbol: trimmed, uppercased, and
/// `^`-prefixed for bare index tickers. Sources and the report cache only
/// ever see this form.
pub fn resolve_symbol(symbol: &str) -> String {
    let symbol = symbol.trim().to_ascii_uppercase();
    if !symbol.starts_with('^') && INDEX_TICKERS.contains(&symbol.as_str()) {
        format!("^{}", symbol)
    } else {
        symbol
    }
}

fn fetch_non_empty<S: PriceSource + ?Sized>(
    source: &S,
    symbol: &str,
    start: Option<NaiveDate>,
) -> Result<Vec<RawPriceRecord>, FetchError> {
    let records = source.fetch(symbol, start)?;
    if records.is_empty() {
        return Err(FetchError::NoDataInRange {
            symbol: symbol.to_string(),
            start,
        });
    }
    Ok(records)
}

/// Fetch with symbol resolution.
///
/// Bare index tickers are prefixed first. Indices with a documented inception
/// date default their start to it. If a symbol without `^` yields nothing,
/// one retry is made with the prefix; the original failure is returned when
/// that also fails.
pub fn fetch_resolved<S: PriceSource + ?Sized>(
    source: &S,
    symbol: &str,
    start: Option<NaiveDate>,
) -> Result<FetchedSeries, FetchError> {
    let resolved = resolve_symbol(symbol);
    let start = start.or_else(|| inception_floor(&resolved));

    match fetch_non_empty(source, &resolved, start) {
        Ok(records) => Ok(FetchedSeries { symbol: resolved, records }),
        Err(FetchError::Transport(reason)) => Err(FetchError::Transport(reason)),
        Err(err) if !resolved.starts_with('^') => {
            let caret = format!("^{}", resolved);
            debug!(symbol = %resolved, retry = %caret, "no data, retrying as index");
            match fetch_non_empty(source, &caret, start) {
                Ok(records) => {
                    info!(symbol = %resolved, resolved = %caret, "resolved symbol as index");
                    Ok(FetchedSeries { symbol: caret, records })
                }
                Err(_) => Err(err),
            }
        }
        Err(err) => Err(err),
    }
}

fn on_or_after(record: &RawPriceRecord, start: Option<NaiveDate>) -> bool {
    match (start, record.date.as_deref().and_then(parse_date)) {
        (Some(start), Some(date)) => date >= start,
        _ => true,
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Fixed records per symbol
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: HashMap<String, Vec<RawPriceRecord>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: impl Into<String>, records: Vec<RawPriceRecord>) -> Self {
        self.series.insert(symbol.into(), records);
        self
    }
}

impl PriceSource for InMemorySource {
    fn fetch(&self, symbol: &str, start: Option<NaiveDate>) -> Result<Vec<RawPriceRecord>, FetchError> {
        let records = self.series.get(symbol).ok_or_else(|| FetchError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;
        Ok(records.iter().filter(|r| on_or_after(r, start)).cloned().collect())
    }
}

// ============================================================================
// JSON files
// ============================================================================

/// Read a JSON array of raw records
pub fn read_json_records(path: &Path) -> Result<Vec<RawPriceRecord>, FetchError> {
    let content = std::fs::read_to_string(path).map_err(|e| FetchError::Transport(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content).map_err(|e| FetchError::Transport(format!("{}: {}", path.display(), e)))
}

/// One `<symbol>.json` file per symbol in a directory
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PriceSource for JsonDirSource {
    fn fetch(&self, symbol: &str, start: Option<NaiveDate>) -> Result<Vec<RawPriceRecord>, FetchError> {
        let path = self.dir.join(format!("{}.json", symbol));
        if !path.exists() {
            return Err(FetchError::SymbolNotFound { symbol: symbol.to_string() });
        }
        let records = read_json_records(&path)?;
        Ok(records.into_iter().filter(|r| on_or_after(r, start)).collect())
    }
}

// ============================================================================
// Parquet files
// ============================================================================

/// One `<symbol>.parquet` file per symbol with `Date`, `Open`, `High`, `Low`,
/// `Close`, optional `Adj Close` and `Volume` columns.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    dir: PathBuf,
}

impl ParquetSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Symbols with a parquet file in the directory, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| {
                        let path = e.path();
                        if path.extension().map_or(false, |ext| ext == "parquet") {
                            path.file_stem().and_then(|s| s.to_str()).map(|s| s.to_string())
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        symbols.sort();
        symbols
    }
}

impl PriceSource for ParquetSource {
    fn fetch(&self, symbol: &str, start: Option<NaiveDate>) -> Result<Vec<RawPriceRecord>, FetchError> {
        let path = self.dir.join(format!("{}.parquet", symbol));
        if !path.exists() {
            return Err(FetchError::SymbolNotFound { symbol: symbol.to_string() });
        }
        let records = read_parquet_records(&path)?;
        Ok(records.into_iter().filter(|r| on_or_after(r, start)).collect())
    }
}

fn transport(path: &Path, err: impl std::fmt::Display) -> FetchError {
    FetchError::Transport(format!("{}: {}", path.display(), err))
}

/// Read every row of a price parquet file
pub fn read_parquet_records(path: &Path) -> Result<Vec<RawPriceRecord>, FetchError> {
    let file = File::open(path).map_err(|e| transport(path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|builder| builder.build())
        .map_err(|e| transport(path, e))?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| transport(path, e))?;
        append_batch(&batch, &mut records);
    }
    debug!(path = %path.display(), rows = records.len(), "read parquet prices");
    Ok(records)
}

fn append_batch(batch: &RecordBatch, out: &mut Vec<RawPriceRecord>) {
    let dates = date_column(batch, "Date");
    let opens = f64_column(batch, "Open");
    let highs = f64_column(batch, "High");
    let lows = f64_column(batch, "Low");
    let closes = f64_column(batch, "Close");
    let adj_closes = f64_column(batch, "Adj Close");
    let volumes = f64_column(batch, "Volume");

    for i in 0..batch.num_rows() {
        out.push(RawPriceRecord {
            date: dates[i].clone(),
            open: opens[i],
            high: highs[i],
            low: lows[i],
            close: closes[i],
            adj_close: adj_closes[i],
            volume: volumes[i],
        });
    }
}

/// Dates as `YYYY-MM-DD` strings from a Utf8 or Date32 column
fn date_column(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let n = batch.num_rows();
    let Some(col) = batch.column_by_name(name) else {
        return vec![None; n];
    };

    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        (0..n)
            .map(|i| (!arr.is_null(i)).then(|| arr.value(i).to_string()))
            .collect()
    } else if let Some(arr) = col.as_any().downcast_ref::<Date32Array>() {
        (0..n)
            .map(|i| {
                if arr.is_null(i) {
                    None
                } else {
                    arr.value_as_date(i).map(|d| d.format("%Y-%m-%d").to_string())
                }
            })
            .collect()
    } else {
        vec![None; n]
    }
}

/// Numeric column as optional f64, accepting Float64 or Int64 storage
fn f64_column(batch: &RecordBatch, name: &str) -> Vec<Option<f64>> {
    let n = batch.num_rows();
    let Some(col) = batch.column_by_name(name) else {
        return vec![None; n];
    };

    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        (0..n).map(|i| (!arr.is_null(i)).then(|| arr.value(i))).collect()
    } else if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        (0..n).map(|i| (!arr.is_null(i)).then(|| arr.value(i) as f64)).collect()
    } else {
        vec![None; n]
    }
}

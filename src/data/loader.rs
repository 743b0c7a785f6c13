//! CSV loaders for bar and signal series.
//!
//! Bar files carry one row per sampling interval with the columns
//! `timestamp,open,high,low,close`; signal files carry a `signal` column
//! with one {-1,0,1} value per bar. Structural checks that span both
//! series (length match, monotonic timestamps) live in the engine.

use std::path::Path;

use chrono::NaiveDateTime;
use polars::prelude::*;
use thiserror::Error;

use super::types::{PriceBar, Signal};

/// Expected columns in a bar file.
pub const BAR_COLUMNS: &[&str] = &["timestamp", "open", "high", "low", "close"];

/// Timestamp format used in bar files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.display().to_string()));
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

fn f64_at(column: &Float64Chunked, name: &str, row: usize) -> Result<f64, LoaderError> {
    column
        .get(row)
        .ok_or_else(|| LoaderError::InvalidData(format!("missing {} at row {}", name, row)))
}

/// Load a time-ordered bar series from a CSV file.
pub fn load_bars(path: &Path) -> Result<Vec<PriceBar>, LoaderError> {
    let df = read_csv(path)?;

    let timestamps = df.column("timestamp")?.str()?;
    let open = df.column("open")?.f64()?;
    let high = df.column("high")?.f64()?;
    let low = df.column("low")?.f64()?;
    let close = df.column("close")?.f64()?;

    let mut bars = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let raw = timestamps
            .get(row)
            .ok_or_else(|| LoaderError::InvalidData(format!("missing timestamp at row {}", row)))?;
        let timestamp = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| {
            LoaderError::InvalidData(format!("bad timestamp {:?} at row {}: {}", raw, row, e))
        })?;

        bars.push(PriceBar {
            timestamp,
            open: f64_at(open, "open", row)?,
            high: f64_at(high, "high", row)?,
            low: f64_at(low, "low", row)?,
            close: f64_at(close, "close", row)?,
        });
    }

    Ok(bars)
}

/// Load a signal series from a CSV file with a `signal` column.
pub fn load_signals(path: &Path) -> Result<Vec<Signal>, LoaderError> {
    let df = read_csv(path)?;
    let column = df.column("signal")?.i64()?;

    let mut signals = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let value = column
            .get(row)
            .ok_or_else(|| LoaderError::InvalidData(format!("missing signal at row {}", row)))?;
        let signal = Signal::from_i64(value).ok_or_else(|| {
            LoaderError::InvalidData(format!(
                "signal {} at row {} outside {{-1, 0, 1}}",
                value, row
            ))
        })?;
        signals.push(signal);
    }

    Ok(signals)
}

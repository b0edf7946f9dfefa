//! CSV ingestion for bar data.
//!
//! Expects a header row with `timestamp,open,high,low,close,volume`.
//! Timestamps accept `%Y-%m-%d %H:%M:%S`, RFC 3339-style
//! `%Y-%m-%dT%H:%M:%S`, or a bare date (taken as midnight).

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::domain::Bar;

use super::series::{BarSeries, DataError};

#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, DataError> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(ts);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).expect("midnight is valid"));
    }
    Err(DataError::Ingest(format!("unparseable timestamp '{raw}'")))
}

impl BarSeries {
    /// Load and validate a bar series from a CSV file.
    pub fn from_csv(path: &Path) -> Result<BarSeries, DataError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| DataError::Ingest(format!("{}: {e}", path.display())))?;

        let mut bars = Vec::new();
        for record in reader.deserialize::<CsvBar>() {
            let record = record.map_err(|e| DataError::Ingest(e.to_string()))?;
            bars.push(Bar {
                timestamp: parse_timestamp(&record.timestamp)?,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume,
            });
        }

        BarSeries::new(bars)
    }
}

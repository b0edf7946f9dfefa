//! BarSeries — a validated, immutable, time-ordered bar sequence.
//!
//! The constructor is the single validation gate: once a `BarSeries`
//! exists, every bar is sane and timestamps are strictly increasing.
//! There are no mutation methods.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::domain::Bar;

/// Errors from bar series construction and slicing.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("bar {index} at {timestamp}: timestamp not strictly increasing")]
    NonMonotonicTimestamp {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("bar {index} at {timestamp}: malformed OHLCV ({detail})")]
    MalformedBar {
        index: usize,
        timestamp: NaiveDateTime,
        detail: String,
    },

    #[error("no bars in range {start} ..= {end}")]
    EmptyRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("series contains no bars")]
    Empty,

    #[error("ingest failed: {0}")]
    Ingest(String),
}

/// Ordered, immutable sequence of bars for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate and wrap a bar sequence.
    ///
    /// Rejects an empty input, any bar failing `Bar::is_sane`, and any
    /// timestamp that is not strictly greater than its predecessor
    /// (duplicates included).
    pub fn new(bars: Vec<Bar>) -> Result<Self, DataError> {
        if bars.is_empty() {
            return Err(DataError::Empty);
        }

        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(DataError::MalformedBar {
                    index,
                    timestamp: bar.timestamp,
                    detail: format!(
                        "o={} h={} l={} c={} v={}",
                        bar.open, bar.high, bar.low, bar.close, bar.volume
                    ),
                });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(DataError::NonMonotonicTimestamp {
                    index,
                    timestamp: bar.timestamp,
                });
            }
        }

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    /// History visible at `index`: bars `0..=index`.
    ///
    /// This is the only view the engine hands to a strategy, so a strategy
    /// cannot read past the current bar.
    pub fn up_to(&self, index: usize) -> &[Bar] {
        &self.bars[..=index]
    }

    /// Inclusive timestamp-range slice.
    pub fn slice_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<BarSeries, DataError> {
        let bars: Vec<Bar> = self
            .bars
            .iter()
            .filter(|b| b.timestamp >= start && b.timestamp <= end)
            .cloned()
            .collect();

        if bars.is_empty() {
            return Err(DataError::EmptyRange { start, end });
        }
        // Ordering and sanity survive filtering; skip re-validation.
        Ok(BarSeries { bars })
    }

    /// Inclusive calendar-date slice: `[start 00:00:00, end 23:59:59]`.
    pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<BarSeries, DataError> {
        let start_ts = start.and_hms_opt(0, 0, 0).expect("midnight is valid");
        let end_ts = end.and_hms_opt(23, 59, 59).expect("23:59:59 is valid");
        self.slice_range(start_ts, end_ts)
    }
}

//! Bar series loading and validation.

pub mod csv;
pub mod series;

pub use series::{BarSeries, DataError};

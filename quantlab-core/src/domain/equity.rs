//! Equity point — one account-value sample per processed bar.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Single point in the equity curve. Includes unrealized P&L of any open
/// position, marked at the bar's close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

//! Trade — an immutable completed round-trip with realized P&L.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::signal::Direction;

/// Why a position was closed.
///
/// Stop and target exits are risk events raised by the engine itself;
/// `SignalExit` is a strategy decision; `EndOfData` is the forced close of
/// whatever is still open when the series runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    SignalExit,
    StopLoss,
    Target,
    EndOfData,
}

/// A complete round-trip trade record: entry → exit.
///
/// Appended to the trade ledger by the simulation loop and never mutated
/// afterwards. `pnl` is net of entry and exit commissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub direction: Direction,

    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    pub exit_bar: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,

    pub quantity: f64,

    /// Net realized P&L: (exit - entry) * quantity * sign - commission.
    pub pnl: f64,
    /// Total commission charged (entry + exit).
    pub commission: f64,

    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    /// Net return as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        let notional = self.entry_price * self.quantity;
        if notional == 0.0 {
            return 0.0;
        }
        self.pnl / notional
    }

    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }
}

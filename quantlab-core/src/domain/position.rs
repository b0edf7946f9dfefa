//! Position — an open, unrealized trade.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::signal::Direction;

/// The engine's mutable state for the single open trade.
///
/// Created by the simulation loop on an entry fill, destroyed when the exit
/// converts it into a `Trade`. The loop is the only writer; at most one
/// position exists at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub direction: Direction,
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub quantity: f64,
    pub stop_loss: Option<f64>,
    pub target: Option<f64>,
    /// Commission already charged at entry; folded into the trade's net P&L.
    pub entry_commission: f64,
}

impl Position {
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        (current_price - self.entry_price) * self.quantity * self.direction.sign()
    }

    pub fn notional(&self) -> f64 {
        self.entry_price * self.quantity
    }
}

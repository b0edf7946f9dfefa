//! Fill arithmetic and risk-exit triggers.
//!
//! Slippage is always adverse: entries fill away from the trader, exits
//! fill against them. Stop and target exits fill exactly at the trigger
//! level, except when the bar gaps through it — then the fill is at the
//! open, which is the price actually available.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Direction, ExitReason, Position};

use super::config::FillBasis;

/// Price an entry fills at: basis price pushed against the trader.
pub fn entry_fill_price(bar: &Bar, basis: FillBasis, direction: Direction, slippage: f64) -> f64 {
    let base = basis_price(bar, basis);
    match direction {
        Direction::Long => base * (1.0 + slippage),
        Direction::Short => base * (1.0 - slippage),
    }
}

/// Price a strategy-driven exit fills at: basis price pushed against the trader.
pub fn exit_fill_price(bar: &Bar, basis: FillBasis, direction: Direction, slippage: f64) -> f64 {
    let base = basis_price(bar, basis);
    match direction {
        Direction::Long => base * (1.0 - slippage),
        Direction::Short => base * (1.0 + slippage),
    }
}

fn basis_price(bar: &Bar, basis: FillBasis) -> f64 {
    match basis {
        FillBasis::Open => bar.open,
        FillBasis::Close => bar.close,
    }
}

/// Check the position's stop and target against a bar.
///
/// Returns the exit fill price and reason if either level is crossed.
/// The stop is checked before the target: when one bar spans both, the
/// adverse outcome wins. A bar that opens beyond a level fills at the
/// open instead of the level (gap rule).
pub fn check_stop_and_target(position: &Position, bar: &Bar) -> Option<(f64, ExitReason)> {
    match position.direction {
        Direction::Long => {
            if let Some(stop) = position.stop_loss {
                if bar.low <= stop {
                    let price = if bar.open <= stop { bar.open } else { stop };
                    return Some((price, ExitReason::StopLoss));
                }
            }
            if let Some(target) = position.target {
                if bar.high >= target {
                    let price = if bar.open >= target { bar.open } else { target };
                    return Some((price, ExitReason::Target));
                }
            }
        }
        Direction::Short => {
            if let Some(stop) = position.stop_loss {
                if bar.high >= stop {
                    let price = if bar.open >= stop { bar.open } else { stop };
                    return Some((price, ExitReason::StopLoss));
                }
            }
            if let Some(target) = position.target {
                if bar.low <= target {
                    let price = if bar.open <= target { bar.open } else { target };
                    return Some((price, ExitReason::Target));
                }
            }
        }
    }
    None
}

/// Validate suggested risk levels against the actual fill price.
///
/// A stop on the wrong side of the fill (or a non-positive level) makes
/// the entry unexecutable; the caller records a rejection instead of
/// opening the position.
pub fn validate_risk_levels(
    direction: Direction,
    fill_price: f64,
    stop_loss: Option<f64>,
    target: Option<f64>,
) -> Result<(), String> {
    for (label, level) in [("stop_loss", stop_loss), ("target", target)] {
        if let Some(level) = level {
            if level <= 0.0 || !level.is_finite() {
                return Err(format!("{label} {level} is not a valid price"));
            }
        }
    }
    match direction {
        Direction::Long => {
            if let Some(stop) = stop_loss {
                if stop >= fill_price {
                    return Err(format!("stop_loss {stop} at or above long entry {fill_price}"));
                }
            }
            if let Some(target) = target {
                if target <= fill_price {
                    return Err(format!("target {target} at or below long entry {fill_price}"));
                }
            }
        }
        Direction::Short => {
            if let Some(stop) = stop_loss {
                if stop <= fill_price {
                    return Err(format!("stop_loss {stop} at or below short entry {fill_price}"));
                }
            }
            if let Some(target) = target {
                if target >= fill_price {
                    return Err(format!("target {target} at or above short entry {fill_price}"));
                }
            }
        }
    }
    Ok(())
}

/// An entry signal the engine declined to execute, and why.
///
/// Rejections are recorded, never raised: a malformed stop suggestion is a
/// skipped trade, not a crashed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedEntry {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub direction: Direction,
    pub reason: String,
}

//! The bar-by-bar simulation loop.
//!
//! Per-bar order while running:
//! 1. Risk exits: stop/target checks on any open position, before the
//!    strategy is consulted. A bar that both hits a stop and produces a
//!    fresh signal resolves in favor of risk management.
//! 2. Strategy decision: entries when flat, signal exits when open.
//! 3. Mark-to-market: one equity point per bar at the close, including
//!    unrealized P&L.
//!
//! Any position still open when the series ends is force-closed at the
//! final close with `ExitReason::EndOfData`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::BarSeries;
use crate::domain::{Bar, Direction, EquityPoint, ExitReason, Position, Signal, Trade};
use crate::strategy::{Strategy, StrategyError};

use super::config::{ConfigError, EngineConfig, PositionSizing};
use super::execution::{
    check_stop_and_target, entry_fill_price, exit_fill_price, validate_risk_levels, RejectedEntry,
};

/// Simulation phases. Warmup ends once the bar index reaches the
/// strategy's requirement; the series running out finishes the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    AwaitingWarmup,
    Running,
    Finished,
}

/// Everything a completed (or interrupted) run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub rejected_entries: Vec<RejectedEntry>,
    pub final_equity: f64,
    pub bars_processed: usize,
    pub warmup_bars: usize,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A strategy fault. Partial results up to the failing bar are
    /// preserved so a long backtest's progress is not lost.
    #[error("strategy '{strategy}' failed at bar {bar_index} ({timestamp}): {source}")]
    StrategyExecution {
        strategy: String,
        bar_index: usize,
        timestamp: NaiveDateTime,
        source: StrategyError,
        partial: Box<RunResult>,
    },
}

/// Mutable state owned by the loop. The loop is the sole writer of the
/// position, ledger, and curve.
struct EngineState {
    position: Option<Position>,
    /// Realized net P&L to date, commissions included as they are charged.
    realized_pnl: f64,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
    rejected_entries: Vec<RejectedEntry>,
}

impl EngineState {
    fn new(num_bars: usize) -> Self {
        Self {
            position: None,
            realized_pnl: 0.0,
            trades: Vec::new(),
            equity_curve: Vec::with_capacity(num_bars),
            rejected_entries: Vec::new(),
        }
    }

    fn equity_at(&self, initial_capital: f64, close: f64) -> f64 {
        let unrealized = self
            .position
            .as_ref()
            .map(|p| p.unrealized_pnl(close))
            .unwrap_or(0.0);
        initial_capital + self.realized_pnl + unrealized
    }

    fn open_position(
        &mut self,
        bar: &Bar,
        bar_index: usize,
        direction: Direction,
        stop_loss: Option<f64>,
        target: Option<f64>,
        config: &EngineConfig,
    ) {
        let fill_price = entry_fill_price(bar, config.entry_basis, direction, config.slippage_pct);

        let quantity = match config.sizing {
            PositionSizing::FixedQuantity { quantity } => quantity,
            PositionSizing::PercentEquity { percent } => {
                let equity = self.equity_at(config.initial_capital, bar.close);
                (equity * percent / fill_price).floor()
            }
        };
        if quantity < 1.0 {
            self.rejected_entries.push(RejectedEntry {
                bar_index,
                timestamp: bar.timestamp,
                direction,
                reason: format!("sized quantity {quantity} below one unit"),
            });
            return;
        }

        if let Err(reason) = validate_risk_levels(direction, fill_price, stop_loss, target) {
            self.rejected_entries.push(RejectedEntry {
                bar_index,
                timestamp: bar.timestamp,
                direction,
                reason,
            });
            return;
        }

        let entry_commission = config.commission.cost(fill_price * quantity);
        self.realized_pnl -= entry_commission;

        self.position = Some(Position {
            direction,
            entry_bar: bar_index,
            entry_time: bar.timestamp,
            entry_price: fill_price,
            quantity,
            stop_loss,
            target,
            entry_commission,
        });
    }

    fn reject_final_bar_entry(&mut self, bar: &Bar, bar_index: usize, direction: Direction) {
        self.rejected_entries.push(RejectedEntry {
            bar_index,
            timestamp: bar.timestamp,
            direction,
            reason: "entry on final bar would close immediately".to_string(),
        });
    }

    fn close_position(
        &mut self,
        position: Position,
        bar: &Bar,
        bar_index: usize,
        exit_price: f64,
        exit_reason: ExitReason,
        config: &EngineConfig,
    ) {
        let exit_commission = config.commission.cost(exit_price * position.quantity);
        let gross =
            (exit_price - position.entry_price) * position.quantity * position.direction.sign();

        // Entry commission already hit realized P&L when it was charged.
        self.realized_pnl += gross - exit_commission;

        self.trades.push(Trade {
            direction: position.direction,
            entry_bar: position.entry_bar,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_bar: bar_index,
            exit_time: bar.timestamp,
            exit_price,
            quantity: position.quantity,
            pnl: gross - position.entry_commission - exit_commission,
            commission: position.entry_commission + exit_commission,
            exit_reason,
        });
    }

    fn into_result(self, initial_capital: f64, warmup_bars: usize) -> RunResult {
        let final_equity = self
            .equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);
        RunResult {
            bars_processed: self.equity_curve.len(),
            trades: self.trades,
            equity_curve: self.equity_curve,
            rejected_entries: self.rejected_entries,
            final_equity,
            warmup_bars,
        }
    }
}

/// Run a backtest: one series, one strategy, one position at a time.
pub fn run_backtest(
    series: &BarSeries,
    strategy: &dyn Strategy,
    config: &EngineConfig,
) -> Result<RunResult, EngineError> {
    config.validate()?;

    let warmup_bars = strategy.warmup_bars();
    let mut state = EngineState::new(series.len());
    let mut phase = EnginePhase::AwaitingWarmup;

    for (t, bar) in series.bars().iter().enumerate() {
        if phase == EnginePhase::AwaitingWarmup && t >= warmup_bars {
            phase = EnginePhase::Running;
        }

        if phase == EnginePhase::Running {
            // Risk exits take precedence over anything the strategy says
            // this bar.
            if let Some(position) = state.position.take() {
                match check_stop_and_target(&position, bar) {
                    Some((price, reason)) => {
                        state.close_position(position, bar, t, price, reason, config);
                    }
                    None => state.position = Some(position),
                }
            }

            let signal = match strategy.on_bar(series.up_to(t), state.position.as_ref()) {
                Ok(signal) => signal,
                Err(source) => {
                    return Err(EngineError::StrategyExecution {
                        strategy: strategy.name().to_string(),
                        bar_index: t,
                        timestamp: bar.timestamp,
                        source,
                        partial: Box::new(state.into_result(config.initial_capital, warmup_bars)),
                    });
                }
            };

            // An entry on the final bar would be force-closed in the same
            // instant it opened, so it is rejected instead of filled.
            let last_bar = t + 1 == series.len();
            match signal {
                Signal::EnterLong { stop_loss, target } if state.position.is_none() => {
                    if last_bar {
                        state.reject_final_bar_entry(bar, t, Direction::Long);
                    } else {
                        state.open_position(bar, t, Direction::Long, stop_loss, target, config);
                    }
                }
                Signal::EnterShort { stop_loss, target } if state.position.is_none() => {
                    if last_bar {
                        state.reject_final_bar_entry(bar, t, Direction::Short);
                    } else {
                        state.open_position(bar, t, Direction::Short, stop_loss, target, config);
                    }
                }
                Signal::Exit => {
                    if let Some(position) = state.position.take() {
                        let price = exit_fill_price(
                            bar,
                            config.entry_basis,
                            position.direction,
                            config.slippage_pct,
                        );
                        state.close_position(position, bar, t, price, ExitReason::SignalExit, config);
                    }
                }
                // Entries while a position is open are no-ops;
                // single-position-at-a-time is enforced here.
                _ => {}
            }
        }

        state.equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity: state.equity_at(config.initial_capital, bar.close),
        });
    }

    if phase == EnginePhase::Running {
        phase = EnginePhase::Finished;
    }

    // End of data: never report an open position as part of final results.
    if phase == EnginePhase::Finished {
        if let Some(position) = state.position.take() {
            let last_index = series.len() - 1;
            let last_bar = series.last().clone();
            state.close_position(
                position,
                &last_bar,
                last_index,
                last_bar.close,
                ExitReason::EndOfData,
                config,
            );
            // Re-mark the final equity point now that the close realized.
            if let Some(point) = state.equity_curve.last_mut() {
                point.equity = config.initial_capital + state.realized_pnl;
            }
        }
    }

    Ok(state.into_result(config.initial_capital, warmup_bars))
}

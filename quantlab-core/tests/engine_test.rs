//! Integration tests for the simulation loop.
//!
//! Tests:
//! 1. Entry/exit accounting with a scripted strategy
//! 2. Risk exits: stop, target, gap-through, stop-before-target
//! 3. Warmup: no activity before the strategy's lookback is satisfied
//! 4. Single-position invariant and rejected entries
//! 5. End-of-data force close
//! 6. Strategy faults preserve partial results

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use quantlab_core::data::BarSeries;
use quantlab_core::domain::{Bar, Direction, ExitReason, Position, Signal};
use quantlab_core::engine::{
    run_backtest, EngineConfig, EngineError, FillBasis, PositionSizing,
};
use quantlab_core::strategy::{Strategy, StrategyError};

fn day(i: usize) -> NaiveDateTime {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    (base + chrono::Duration::days(i as i64))
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: day(i),
        open,
        high,
        low,
        close,
        volume: 1_000.0,
    }
}

/// N bars pinned at a single price.
fn flat_bars(n: usize, price: f64) -> Vec<Bar> {
    (0..n)
        .map(|i| bar(i, price, price + 1.0, price - 1.0, price))
        .collect()
}

/// Emits a fixed signal at each scripted bar index, `Hold` elsewhere.
struct Scripted {
    warmup: usize,
    signals: HashMap<usize, Signal>,
}

impl Scripted {
    fn new(signals: &[(usize, Signal)]) -> Self {
        Self {
            warmup: 0,
            signals: signals.iter().copied().collect(),
        }
    }
}

impl Strategy for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn warmup_bars(&self) -> usize {
        self.warmup
    }

    fn on_bar(
        &self,
        history: &[Bar],
        _position: Option<&Position>,
    ) -> Result<Signal, StrategyError> {
        let t = history.len() - 1;
        Ok(self.signals.get(&t).copied().unwrap_or(Signal::Hold))
    }
}

/// Fails once the bar index reaches `fail_at`.
struct FailAt {
    fail_at: usize,
}

impl Strategy for FailAt {
    fn name(&self) -> &str {
        "fail_at"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn on_bar(
        &self,
        history: &[Bar],
        _position: Option<&Position>,
    ) -> Result<Signal, StrategyError> {
        if history.len() - 1 >= self.fail_at {
            Err(StrategyError("synthetic fault".to_string()))
        } else {
            Ok(Signal::Hold)
        }
    }
}

// ──────────────────────────────────────────────
// Entry/exit accounting
// ──────────────────────────────────────────────

#[test]
fn entry_and_signal_exit_book_expected_pnl() {
    let mut bars = flat_bars(10, 100.0);
    bars[5] = bar(5, 100.0, 102.0, 99.0, 101.0);
    bars[8] = bar(8, 120.0, 121.0, 119.0, 120.0);
    bars[9] = bar(9, 120.0, 121.0, 119.0, 120.0);
    let series = BarSeries::new(bars).unwrap();

    let strategy = Scripted::new(&[
        (5, Signal::enter(Direction::Long)),
        (8, Signal::Exit),
    ]);
    let config = EngineConfig {
        entry_basis: FillBasis::Open,
        ..EngineConfig::frictionless(100_000.0, 10.0)
    };

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_bar, 5);
    assert_eq!(trade.exit_bar, 8);
    assert_eq!(trade.entry_price, 100.0);
    assert_eq!(trade.exit_price, 120.0);
    assert_eq!(trade.pnl, 200.0);
    assert_eq!(trade.exit_reason, ExitReason::SignalExit);
    assert_eq!(result.final_equity, 100_200.0);
}

#[test]
fn short_trade_profits_when_price_falls() {
    let mut bars = flat_bars(8, 100.0);
    bars[6] = bar(6, 90.0, 91.0, 89.0, 90.0);
    bars[7] = bar(7, 90.0, 91.0, 89.0, 90.0);
    let series = BarSeries::new(bars).unwrap();

    let strategy = Scripted::new(&[
        (2, Signal::enter(Direction::Short)),
        (6, Signal::Exit),
    ]);
    let config = EngineConfig::frictionless(100_000.0, 5.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    let trade = &result.trades[0];
    assert_eq!(trade.direction, Direction::Short);
    assert_eq!(trade.entry_price, 100.0);
    assert_eq!(trade.exit_price, 90.0);
    assert_eq!(trade.pnl, 50.0);
}

#[test]
fn commissions_reduce_trade_pnl_and_equity() {
    let mut bars = flat_bars(8, 100.0);
    bars[6] = bar(6, 105.0, 106.0, 104.0, 105.0);
    bars[7] = bar(7, 105.0, 106.0, 104.0, 105.0);
    let series = BarSeries::new(bars).unwrap();

    let strategy = Scripted::new(&[
        (2, Signal::enter(Direction::Long)),
        (6, Signal::Exit),
    ]);
    let mut config = EngineConfig::frictionless(100_000.0, 10.0);
    config.commission = quantlab_core::engine::CommissionModel::Flat { amount: 1.0 };

    let result = run_backtest(&series, &strategy, &config).unwrap();

    let trade = &result.trades[0];
    assert_eq!(trade.commission, 2.0);
    assert_eq!(trade.pnl, 48.0);
    assert_eq!(result.final_equity, 100_048.0);
}

#[test]
fn adverse_slippage_moves_entry_against_the_trade() {
    let series = BarSeries::new(flat_bars(6, 100.0)).unwrap();

    let strategy = Scripted::new(&[(2, Signal::enter(Direction::Long)), (4, Signal::Exit)]);
    let mut config = EngineConfig::frictionless(100_000.0, 1.0);
    config.slippage_pct = 0.01;

    let result = run_backtest(&series, &strategy, &config).unwrap();

    let trade = &result.trades[0];
    // Long pays up on entry and gives up on exit.
    assert!((trade.entry_price - 101.0).abs() < 1e-12);
    assert!((trade.exit_price - 99.0).abs() < 1e-12);
    assert!(trade.pnl < 0.0);
}

// ──────────────────────────────────────────────
// Risk exits
// ──────────────────────────────────────────────

#[test]
fn stop_loss_overrides_hold_signal() {
    let mut bars = flat_bars(7, 100.0);
    bars[4] = bar(4, 99.0, 100.0, 94.0, 96.0);
    bars[5] = bar(5, 96.0, 97.0, 95.0, 96.0);
    bars[6] = bar(6, 96.0, 97.0, 95.0, 96.0);
    let series = BarSeries::new(bars).unwrap();

    let strategy = Scripted::new(&[(
        2,
        Signal::EnterLong {
            stop_loss: Some(95.0),
            target: None,
        },
    )]);
    let config = EngineConfig::frictionless(100_000.0, 1.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_bar, 4);
    assert_eq!(trade.exit_price, 95.0);
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
}

#[test]
fn gap_through_stop_fills_at_open() {
    let mut bars = flat_bars(7, 100.0);
    bars[4] = bar(4, 90.0, 96.0, 89.0, 95.0);
    bars[5] = bar(5, 95.0, 96.0, 94.0, 95.0);
    bars[6] = bar(6, 95.0, 96.0, 94.0, 95.0);
    let series = BarSeries::new(bars).unwrap();

    let strategy = Scripted::new(&[(
        2,
        Signal::EnterLong {
            stop_loss: Some(95.0),
            target: None,
        },
    )]);
    let config = EngineConfig::frictionless(100_000.0, 1.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    let trade = &result.trades[0];
    assert_eq!(trade.exit_price, 90.0);
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
}

#[test]
fn target_exit_fills_at_target_price() {
    let mut bars = flat_bars(7, 100.0);
    bars[4] = bar(4, 105.0, 111.0, 104.0, 109.0);
    bars[5] = bar(5, 109.0, 110.0, 108.0, 109.0);
    bars[6] = bar(6, 109.0, 110.0, 108.0, 109.0);
    let series = BarSeries::new(bars).unwrap();

    let strategy = Scripted::new(&[(
        2,
        Signal::EnterLong {
            stop_loss: None,
            target: Some(110.0),
        },
    )]);
    let config = EngineConfig::frictionless(100_000.0, 1.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    let trade = &result.trades[0];
    assert_eq!(trade.exit_price, 110.0);
    assert_eq!(trade.exit_reason, ExitReason::Target);
}

#[test]
fn stop_wins_when_bar_spans_both_stop_and_target() {
    let mut bars = flat_bars(7, 100.0);
    bars[4] = bar(4, 100.0, 112.0, 94.0, 111.0);
    bars[5] = bar(5, 111.0, 112.0, 110.0, 111.0);
    bars[6] = bar(6, 111.0, 112.0, 110.0, 111.0);
    let series = BarSeries::new(bars).unwrap();

    let strategy = Scripted::new(&[(
        2,
        Signal::EnterLong {
            stop_loss: Some(95.0),
            target: Some(110.0),
        },
    )]);
    let config = EngineConfig::frictionless(100_000.0, 1.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    let trade = &result.trades[0];
    assert_eq!(trade.exit_price, 95.0);
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
}

#[test]
fn risk_exit_takes_precedence_over_signal_exit() {
    // Bar 4 both breaches the stop and carries a scripted Exit signal;
    // the close must be booked as a stop fill, not a signal exit.
    let mut bars = flat_bars(7, 100.0);
    bars[4] = bar(4, 99.0, 100.0, 94.0, 96.0);
    bars[5] = bar(5, 96.0, 97.0, 95.0, 96.0);
    bars[6] = bar(6, 96.0, 97.0, 95.0, 96.0);
    let series = BarSeries::new(bars).unwrap();

    let strategy = Scripted::new(&[
        (
            2,
            Signal::EnterLong {
                stop_loss: Some(95.0),
                target: None,
            },
        ),
        (4, Signal::Exit),
    ]);
    let config = EngineConfig::frictionless(100_000.0, 1.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_price, 95.0);
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
}

#[test]
fn short_stop_triggers_on_rally() {
    let mut bars = flat_bars(7, 100.0);
    bars[4] = bar(4, 101.0, 106.0, 100.0, 104.0);
    bars[5] = bar(5, 104.0, 105.0, 103.0, 104.0);
    bars[6] = bar(6, 104.0, 105.0, 103.0, 104.0);
    let series = BarSeries::new(bars).unwrap();

    let strategy = Scripted::new(&[(
        2,
        Signal::EnterShort {
            stop_loss: Some(105.0),
            target: None,
        },
    )]);
    let config = EngineConfig::frictionless(100_000.0, 1.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    let trade = &result.trades[0];
    assert_eq!(trade.exit_price, 105.0);
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
    assert_eq!(trade.pnl, -5.0);
}

// ──────────────────────────────────────────────
// Warmup and single-position invariant
// ──────────────────────────────────────────────

#[test]
fn no_activity_before_warmup() {
    let series = BarSeries::new(flat_bars(8, 100.0)).unwrap();

    let mut strategy = Scripted::new(&[(3, Signal::enter(Direction::Long))]);
    strategy.warmup = 5;
    let config = EngineConfig::frictionless(100_000.0, 1.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.warmup_bars, 5);
    for point in &result.equity_curve {
        assert_eq!(point.equity, 100_000.0);
    }
}

#[test]
fn series_shorter_than_warmup_stays_flat() {
    let series = BarSeries::new(flat_bars(8, 100.0)).unwrap();

    let mut strategy = Scripted::new(&[(0, Signal::enter(Direction::Long))]);
    strategy.warmup = 20;
    let config = EngineConfig::frictionless(50_000.0, 1.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.equity_curve.len(), 8);
    assert_eq!(result.final_equity, 50_000.0);
}

#[test]
fn entry_on_final_bar_is_rejected() {
    let series = BarSeries::new(flat_bars(6, 100.0)).unwrap();
    let strategy = Scripted::new(&[(5, Signal::enter(Direction::Long))]);
    let config = EngineConfig::frictionless(100_000.0, 1.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.rejected_entries.len(), 1);
    assert!(result.rejected_entries[0].reason.contains("final bar"));
}

#[test]
fn equity_curve_has_one_point_per_bar() {
    let series = BarSeries::new(flat_bars(12, 100.0)).unwrap();
    let strategy = Scripted::new(&[]);
    let config = EngineConfig::default();

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert_eq!(result.equity_curve.len(), 12);
    assert_eq!(result.bars_processed, 12);
    for (point, b) in result.equity_curve.iter().zip(series.bars()) {
        assert_eq!(point.timestamp, b.timestamp);
    }
}

#[test]
fn entry_while_position_open_is_ignored() {
    let series = BarSeries::new(flat_bars(10, 100.0)).unwrap();

    let strategy = Scripted::new(&[
        (2, Signal::enter(Direction::Long)),
        (3, Signal::enter(Direction::Long)),
        (4, Signal::enter(Direction::Short)),
        (6, Signal::Exit),
    ]);
    let config = EngineConfig::frictionless(100_000.0, 1.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].entry_bar, 2);
    assert_eq!(result.trades[0].direction, Direction::Long);
}

#[test]
fn exit_while_flat_is_a_no_op() {
    let series = BarSeries::new(flat_bars(6, 100.0)).unwrap();
    let strategy = Scripted::new(&[(2, Signal::Exit)]);
    let config = EngineConfig::default();

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert!(result.trades.is_empty());
    assert!(result.rejected_entries.is_empty());
}

// ──────────────────────────────────────────────
// Rejected entries and sizing
// ──────────────────────────────────────────────

#[test]
fn invalid_stop_records_rejected_entry() {
    let series = BarSeries::new(flat_bars(6, 100.0)).unwrap();

    // Stop above the long fill price is nonsensical.
    let strategy = Scripted::new(&[(
        2,
        Signal::EnterLong {
            stop_loss: Some(105.0),
            target: None,
        },
    )]);
    let config = EngineConfig::frictionless(100_000.0, 1.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.rejected_entries.len(), 1);
    let rejected = &result.rejected_entries[0];
    assert_eq!(rejected.bar_index, 2);
    assert_eq!(rejected.direction, Direction::Long);
    assert!(!rejected.reason.is_empty());
}

#[test]
fn percent_equity_sizing_floors_to_whole_units() {
    let series = BarSeries::new(flat_bars(8, 100.0)).unwrap();

    let strategy = Scripted::new(&[
        (2, Signal::enter(Direction::Long)),
        (6, Signal::Exit),
    ]);
    let config = EngineConfig {
        sizing: PositionSizing::PercentEquity { percent: 0.5 },
        ..EngineConfig::frictionless(10_000.0, 1.0)
    };

    let result = run_backtest(&series, &strategy, &config).unwrap();

    // floor(10_000 * 0.5 / 100) = 50 units.
    assert_eq!(result.trades[0].quantity, 50.0);
}

#[test]
fn undersized_percent_equity_entry_is_rejected() {
    let series = BarSeries::new(flat_bars(6, 100.0)).unwrap();

    let strategy = Scripted::new(&[(2, Signal::enter(Direction::Long))]);
    let config = EngineConfig {
        sizing: PositionSizing::PercentEquity { percent: 0.005 },
        ..EngineConfig::frictionless(1_000.0, 1.0)
    };

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.rejected_entries.len(), 1);
    assert!(result.rejected_entries[0].reason.contains("below one unit"));
}

// ──────────────────────────────────────────────
// End of data and faults
// ──────────────────────────────────────────────

#[test]
fn open_position_is_force_closed_at_final_close() {
    let mut bars = flat_bars(8, 100.0);
    bars[7] = bar(7, 103.0, 104.0, 102.0, 103.0);
    let series = BarSeries::new(bars).unwrap();

    let strategy = Scripted::new(&[(2, Signal::enter(Direction::Long))]);
    let config = EngineConfig::frictionless(100_000.0, 2.0);

    let result = run_backtest(&series, &strategy, &config).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_bar, 7);
    assert_eq!(trade.exit_price, 103.0);
    assert_eq!(trade.exit_reason, ExitReason::EndOfData);
    assert_eq!(result.final_equity, 100_006.0);
}

#[test]
fn strategy_fault_preserves_partial_results() {
    let series = BarSeries::new(flat_bars(10, 100.0)).unwrap();
    let strategy = FailAt { fail_at: 6 };
    let config = EngineConfig::default();

    let err = run_backtest(&series, &strategy, &config).unwrap_err();

    match err {
        EngineError::StrategyExecution {
            strategy,
            bar_index,
            partial,
            ..
        } => {
            assert_eq!(strategy, "fail_at");
            assert_eq!(bar_index, 6);
            assert_eq!(partial.equity_curve.len(), 6);
        }
        other => panic!("expected StrategyExecution, got {other:?}"),
    }
}

#[test]
fn invalid_config_is_rejected_before_any_bar() {
    let series = BarSeries::new(flat_bars(4, 100.0)).unwrap();
    let strategy = Scripted::new(&[]);
    let config = EngineConfig {
        initial_capital: -5.0,
        ..EngineConfig::default()
    };

    let err = run_backtest(&series, &strategy, &config).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

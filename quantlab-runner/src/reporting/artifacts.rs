//! Run artifact export: trade tape, equity curve, metrics, full result.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use quantlab_core::domain::{Direction, EquityPoint, ExitReason, Trade};

use crate::runner::BacktestResult;

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Long => "long",
        Direction::Short => "short",
    }
}

fn exit_reason_label(reason: ExitReason) -> &'static str {
    match reason {
        ExitReason::SignalExit => "signal_exit",
        ExitReason::StopLoss => "stop_loss",
        ExitReason::Target => "target",
        ExitReason::EndOfData => "end_of_data",
    }
}

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create trades CSV {}", path.display()))?;

    writeln!(
        file,
        "entry_time,exit_time,direction,entry_price,exit_price,quantity,pnl,return_pct,commission,exit_reason"
    )?;

    for trade in trades {
        writeln!(
            file,
            "{},{},{},{:.4},{:.4},{},{:.4},{:.6},{:.4},{}",
            trade.entry_time,
            trade.exit_time,
            direction_label(trade.direction),
            trade.entry_price,
            trade.exit_price,
            trade.quantity,
            trade.pnl,
            trade.return_pct(),
            trade.commission,
            exit_reason_label(trade.exit_reason),
        )?;
    }

    Ok(())
}

pub fn write_equity_csv(path: &Path, equity_curve: &[EquityPoint]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create equity CSV {}", path.display()))?;

    writeln!(file, "timestamp,equity")?;
    for point in equity_curve {
        writeln!(file, "{},{:.4}", point.timestamp, point.equity)?;
    }

    Ok(())
}

pub fn write_metrics_json(path: &Path, result: &BacktestResult) -> Result<()> {
    let json =
        serde_json::to_string_pretty(&result.metrics).context("Failed to serialize metrics")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write metrics JSON {}", path.display()))?;
    Ok(())
}

/// Full result snapshot, suitable for later reload and comparison.
pub fn write_result_json(path: &Path, result: &BacktestResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write result JSON {}", path.display()))?;
    Ok(())
}

/// Write the standard artifact set for one run into `dir`:
/// trades.csv, equity.csv, metrics.json, result.json.
pub fn write_run_artifacts(dir: &Path, result: &BacktestResult) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create artifact dir {}", dir.display()))?;

    write_trades_csv(&dir.join("trades.csv"), &result.trades)?;
    write_equity_csv(&dir.join("equity.csv"), &result.equity_curve)?;
    write_metrics_json(&dir.join("metrics.json"), result)?;
    write_result_json(&dir.join("result.json"), result)?;
    Ok(())
}

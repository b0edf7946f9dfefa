//! Backtest runner — wires together data, strategy registry, engine,
//! and metrics.
//!
//! The runner owns a validated `BarSeries` and turns a `RunConfig` into
//! a `BacktestResult`: slice the date window, build the strategy, run
//! the simulation loop, compute metrics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use quantlab_core::data::{BarSeries, DataError};
use quantlab_core::domain::{EquityPoint, Trade};
use quantlab_core::engine::{run_backtest, EngineError, RejectedEntry};
use quantlab_core::strategy::{build_strategy, RegistryError};

use crate::config::{ConfigError, RunConfig, RunId};
use crate::metrics::PerformanceMetrics;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("strategy error: {0}")]
    Registry(#[from] RegistryError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: RunConfig,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub rejected_entries: Vec<RejectedEntry>,
    pub final_equity: f64,
    pub bar_count: usize,
    pub warmup_bars: usize,
}

/// Default schema version for serde deserialization of older JSON
/// written before the field existed.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Runs backtests against one loaded series.
pub struct Runner {
    series: BarSeries,
}

impl Runner {
    pub fn new(series: BarSeries) -> Self {
        Self { series }
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    /// Execute one backtest described by `config`.
    ///
    /// The date window is applied first; a window that matches no bars
    /// is a `DataError::EmptyRange`, not a silent zero-trade result.
    pub fn run(&self, config: &RunConfig) -> Result<BacktestResult, RunError> {
        config.validate()?;

        let windowed;
        let series = match (config.start_date, config.end_date) {
            (None, None) => &self.series,
            (start, end) => {
                let start = start.unwrap_or_else(|| self.series.first().timestamp.date());
                let end = end.unwrap_or_else(|| self.series.last().timestamp.date());
                windowed = self.series.slice_dates(start, end)?;
                &windowed
            }
        };

        let strategy = build_strategy(&config.strategy)?;
        let result = run_backtest(series, strategy.as_ref(), &config.engine)?;
        let metrics = PerformanceMetrics::compute(
            config.engine.initial_capital,
            &result.equity_curve,
            &result.trades,
            &config.metrics,
        );

        Ok(BacktestResult {
            schema_version: SCHEMA_VERSION,
            run_id: config.run_id(),
            config: config.clone(),
            metrics,
            trades: result.trades,
            equity_curve: result.equity_curve,
            rejected_entries: result.rejected_entries,
            final_equity: result.final_equity,
            bar_count: result.bars_processed,
            warmup_bars: result.warmup_bars,
        })
    }
}

//! Backtest execution engine: configuration, fill simulation, and the
//! bar-by-bar loop.

pub mod config;
pub mod execution;
pub mod loop_runner;

pub use config::{CommissionModel, ConfigError, EngineConfig, FillBasis, PositionSizing};
pub use execution::RejectedEntry;
pub use loop_runner::{run_backtest, EngineError, EnginePhase, RunResult};

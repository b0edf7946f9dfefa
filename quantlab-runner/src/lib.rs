//! QuantLab Runner — backtest orchestration on top of `quantlab-core`.
//!
//! This crate turns the core simulation loop into a usable workflow:
//! - `RunConfig`: serializable, content-addressed run descriptions
//! - `Runner`: config in, `BacktestResult` out
//! - `PerformanceMetrics`: pure statistics over equity curves and trades
//! - `ParamSweep`: rayon grid search over strategy parameters
//! - `reporting`: CSV/JSON artifact export and text summaries

pub mod config;
pub mod metrics;
pub mod reporting;
pub mod runner;
pub mod sweep;

pub use config::{ConfigError, RunConfig, RunId};
pub use metrics::{MetricsConfig, PerformanceMetrics};
pub use runner::{BacktestResult, RunError, Runner, SCHEMA_VERSION};
pub use sweep::{ParamGrid, ParamSweep, RankMetric, SweepResults};

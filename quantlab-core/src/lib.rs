//! QuantLab Core — bar series, indicators, strategies, and the backtest engine.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, signals, positions, trades, equity points)
//! - Validated bar series with bounded-history views
//! - Rolling indicators (SMA, EMA, true range, Wilder ATR)
//! - The `Strategy` trait plus the built-in crossover strategies
//! - Bar-by-bar simulation loop with risk exits, slippage, and commissions

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod strategy;

//! Strategy — the pluggable decision unit.
//!
//! A strategy sees the bar history up to and including the current bar and
//! the current position (if any), and emits one `Signal` per bar. The
//! history parameter is a slice the engine has already bounded at the
//! current index, so reading future bars is impossible by construction,
//! not by convention.
//!
//! Strategies carry parameters fixed at construction and no mutable state;
//! everything they need must be derivable from the visible history.

pub mod ema_cross_atr;
pub mod ma_crossover;
pub mod registry;

use thiserror::Error;

use crate::domain::{Bar, Position, Signal};

/// A strategy fault. The simulation loop converts this into
/// `EngineError::StrategyExecution` carrying the offending bar index.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StrategyError(pub String);

pub trait Strategy: Send + Sync {
    /// Human-readable name (e.g. "sma_crossover").
    fn name(&self) -> &str;

    /// Minimum history required before non-Hold signals are emitted.
    /// The loop does not call `on_bar` before this many bars have passed.
    fn warmup_bars(&self) -> usize;

    /// Decide on the bar at `history.len() - 1`.
    ///
    /// `history` is bars `0..=current`; `position` is the open position,
    /// if any. Entry signals while a position is open are ignored by the
    /// engine, as is `Exit` while flat.
    fn on_bar(
        &self,
        history: &[Bar],
        position: Option<&Position>,
    ) -> Result<Signal, StrategyError>;
}

pub use ema_cross_atr::EmaCrossAtr;
pub use ma_crossover::{MaCrossover, MaType};
pub use registry::{build_strategy, RegistryError, StrategySpec};

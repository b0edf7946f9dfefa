//! Engine configuration and its validation.
//!
//! The engine never reads ambient state: every knob arrives through
//! `EngineConfig`, validated before the first bar is processed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How many units to buy/sell on an entry signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionSizing {
    /// Fixed number of units per trade.
    FixedQuantity { quantity: f64 },
    /// Fraction of current equity allocated per trade, floored to whole units.
    PercentEquity { percent: f64 },
}

/// Per-fill commission model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommissionModel {
    /// Fixed cost per fill.
    Flat { amount: f64 },
    /// Fraction of fill notional per fill.
    PercentNotional { percent: f64 },
}

impl CommissionModel {
    pub fn cost(&self, notional: f64) -> f64 {
        match self {
            CommissionModel::Flat { amount } => *amount,
            CommissionModel::PercentNotional { percent } => notional.abs() * percent,
        }
    }
}

/// Which bar price an entry (and signal exit) fills at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillBasis {
    Open,
    Close,
}

/// Invalid engine configuration. Raised before any bar is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(f64),

    #[error("position sizing must be positive, got {0}")]
    NonPositiveSizing(f64),

    #[error("slippage must lie in [0, 1), got {0}")]
    SlippageOutOfRange(f64),

    #[error("commission must be non-negative, got {0}")]
    NegativeCommission(f64),
}

/// All parameters the simulation loop consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    pub sizing: PositionSizing,
    /// Adverse fill deviation as a fraction of the fill price.
    pub slippage_pct: f64,
    pub commission: CommissionModel,
    /// Price an entry signal fills at on its signal bar.
    pub entry_basis: FillBasis,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            sizing: PositionSizing::FixedQuantity { quantity: 1.0 },
            slippage_pct: 0.0,
            commission: CommissionModel::Flat { amount: 0.0 },
            entry_basis: FillBasis::Close,
        }
    }
}

impl EngineConfig {
    /// Frictionless config for tests and baselines: no slippage, no
    /// commission, fixed quantity.
    pub fn frictionless(initial_capital: f64, quantity: f64) -> Self {
        Self {
            initial_capital,
            sizing: PositionSizing::FixedQuantity { quantity },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= 0.0 || !self.initial_capital.is_finite() {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        let size_value = match self.sizing {
            PositionSizing::FixedQuantity { quantity } => quantity,
            PositionSizing::PercentEquity { percent } => percent,
        };
        if size_value <= 0.0 || !size_value.is_finite() {
            return Err(ConfigError::NonPositiveSizing(size_value));
        }
        if !(0.0..1.0).contains(&self.slippage_pct) {
            return Err(ConfigError::SlippageOutOfRange(self.slippage_pct));
        }
        let commission_value = match self.commission {
            CommissionModel::Flat { amount } => amount,
            CommissionModel::PercentNotional { percent } => percent,
        };
        if commission_value < 0.0 {
            return Err(ConfigError::NegativeCommission(commission_value));
        }
        Ok(())
    }
}

//! Strategy registry — converts a named spec into a runtime trait object.
//!
//! The external caller describes a strategy as a name plus a flat f64
//! parameter map; `build_strategy` resolves the name and validates the
//! parameters before construction, so registry errors never surface as
//! panics from strategy constructors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ema_cross_atr::EmaCrossAtr;
use super::ma_crossover::{MaCrossover, MaType};
use super::Strategy;

/// Serializable strategy descriptor: registry name plus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub name: String,
    /// BTreeMap so serialization order is stable, which keeps
    /// content-addressed run hashes deterministic.
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl StrategySpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: f64) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("strategy '{name}': {reason}")]
    InvalidParams { name: String, reason: String },
}

/// Extract a named f64 parameter, falling back to `default`.
fn param(spec: &StrategySpec, name: &str, default: f64) -> f64 {
    spec.params.get(name).copied().unwrap_or(default)
}

/// Extract a named usize parameter, falling back to `default`.
fn param_usize(spec: &StrategySpec, name: &str, default: usize) -> usize {
    spec.params
        .get(name)
        .copied()
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Optional positive fraction: absent or <= 0 means disabled.
fn param_opt(spec: &StrategySpec, name: &str) -> Option<f64> {
    spec.params.get(name).copied().filter(|v| *v > 0.0)
}

fn invalid(spec: &StrategySpec, reason: &str) -> RegistryError {
    RegistryError::InvalidParams {
        name: spec.name.clone(),
        reason: reason.to_string(),
    }
}

fn build_crossover(
    spec: &StrategySpec,
    ma_type: MaType,
) -> Result<Box<dyn Strategy>, RegistryError> {
    let fast = param_usize(spec, "fast_period", 12);
    let slow = param_usize(spec, "slow_period", 26);
    if fast < 1 {
        return Err(invalid(spec, "fast_period must be >= 1"));
    }
    if slow <= fast {
        return Err(invalid(spec, "slow_period must be > fast_period"));
    }

    let mut strat = MaCrossover::new(fast, slow, ma_type).with_risk_levels(
        param_opt(spec, "stop_loss_pct"),
        param_opt(spec, "take_profit_pct"),
    );

    let trend = param_usize(spec, "trend_filter_period", 0);
    if trend > 0 {
        if trend <= slow {
            return Err(invalid(spec, "trend_filter_period must exceed slow_period"));
        }
        strat = strat.with_trend_filter(trend);
    }

    Ok(Box::new(strat))
}

/// Create a strategy from a `StrategySpec`.
///
/// Registered names: `sma_crossover`, `ema_crossover`, `ema_cross_atr`.
pub fn build_strategy(spec: &StrategySpec) -> Result<Box<dyn Strategy>, RegistryError> {
    match spec.name.as_str() {
        "sma_crossover" => build_crossover(spec, MaType::Sma),
        "ema_crossover" => build_crossover(spec, MaType::Ema),
        "ema_cross_atr" => {
            let fast = param_usize(spec, "fast_period", 9);
            let slow = param_usize(spec, "slow_period", 21);
            let atr_period = param_usize(spec, "atr_period", 14);
            if fast < 1 || atr_period < 1 {
                return Err(invalid(spec, "periods must be >= 1"));
            }
            if slow <= fast {
                return Err(invalid(spec, "slow_period must be > fast_period"));
            }
            let stop_mult = param(spec, "atr_stop_mult", 2.0);
            let target_mult = param(spec, "atr_target_mult", 3.0);
            if stop_mult <= 0.0 || target_mult <= 0.0 {
                return Err(invalid(spec, "ATR multipliers must be positive"));
            }
            Ok(Box::new(
                EmaCrossAtr::new(fast, slow, atr_period).with_multipliers(stop_mult, target_mult),
            ))
        }
        other => Err(RegistryError::UnknownStrategy(other.to_string())),
    }
}

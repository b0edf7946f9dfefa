//! Performance metrics — pure functions that compute run statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in,
//! scalar out. No dependencies on the runner or the engine loop.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use quantlab_core::domain::{EquityPoint, Trade};

const SECONDS_PER_YEAR: f64 = 365.25 * 86_400.0;

/// Knobs for the return-based metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Annual risk-free rate used for Sharpe/Sortino excess returns.
    pub risk_free_rate: f64,
    /// Bars per year for annualization (252 for daily equities).
    pub periods_per_year: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: 252.0,
        }
    }
}

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// May be `f64::INFINITY` when there are winners and zero losses;
    /// serialized as the string "inf" since JSON has no infinity literal.
    #[serde(with = "non_finite_f64")]
    pub profit_factor: f64,
    pub trade_count: usize,
}

/// JSON codec for f64 values that may be non-finite: finite values are
/// plain numbers, the rest become "inf" / "-inf" / "nan" strings.
mod non_finite_f64 {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        struct NonFiniteVisitor;

        impl Visitor<'_> for NonFiniteVisitor {
            type Value = f64;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a number or one of \"inf\", \"-inf\", \"nan\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
                match v {
                    "inf" => Ok(f64::INFINITY),
                    "-inf" => Ok(f64::NEG_INFINITY),
                    "nan" => Ok(f64::NAN),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }
        }

        deserializer.deserialize_any(NonFiniteVisitor)
    }
}

impl PerformanceMetrics {
    /// Compute all metrics from the deposited capital, an equity curve,
    /// and a trade list.
    ///
    /// The return-based metrics measure against `initial_capital`, not
    /// the first curve point: an entry commission charged on the first
    /// bar already dents the curve, but the money deposited is the base.
    pub fn compute(
        initial_capital: f64,
        equity_curve: &[EquityPoint],
        trades: &[Trade],
        config: &MetricsConfig,
    ) -> Self {
        Self {
            total_return: total_return(initial_capital, equity_curve),
            cagr: cagr(initial_capital, equity_curve),
            sharpe: sharpe_ratio(equity_curve, config),
            sortino: sortino_ratio(equity_curve, config),
            max_drawdown: max_drawdown(equity_curve),
            win_rate: win_rate(trades),
            avg_win: avg_win(trades),
            avg_loss: avg_loss(trades),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
        }
    }

    /// Flat name → value view, ordered for stable reporting output.
    pub fn summary(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("total_return".to_string(), self.total_return);
        map.insert("cagr".to_string(), self.cagr);
        map.insert("sharpe".to_string(), self.sharpe);
        map.insert("sortino".to_string(), self.sortino);
        map.insert("max_drawdown".to_string(), self.max_drawdown);
        map.insert("win_rate".to_string(), self.win_rate);
        map.insert("avg_win".to_string(), self.avg_win);
        map.insert("avg_loss".to_string(), self.avg_loss);
        map.insert("profit_factor".to_string(), self.profit_factor);
        map.insert("trade_count".to_string(), self.trade_count as f64);
        map
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final equity - initial capital) / initial capital.
pub fn total_return(initial_capital: f64, equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.is_empty() || initial_capital <= 0.0 {
        return 0.0;
    }
    let final_eq = equity_curve[equity_curve.len() - 1].equity;
    (final_eq - initial_capital) / initial_capital
}

/// Compound Annual Growth Rate over the actual elapsed calendar time.
///
/// Uses the timestamps of the first and last equity points rather than a
/// bar-count approximation, so sparse or intraday series annualize
/// correctly. Returns 0.0 when the span or equity values are degenerate.
pub fn cagr(initial_capital: f64, equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 || initial_capital <= 0.0 {
        return 0.0;
    }
    let first = &equity_curve[0];
    let last = &equity_curve[equity_curve.len() - 1];
    if last.equity <= 0.0 {
        return 0.0;
    }
    let elapsed = (last.timestamp - first.timestamp).num_seconds() as f64;
    let years = elapsed / SECONDS_PER_YEAR;
    if years <= 0.0 {
        return 0.0;
    }
    (last.equity / initial_capital).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio from per-bar returns.
///
/// Sharpe = mean(excess returns) / std(excess returns) * sqrt(periods).
/// Returns 0.0 if variance is zero or fewer than 2 bars.
pub fn sharpe_ratio(equity_curve: &[EquityPoint], config: &MetricsConfig) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let per_bar_rf = config.risk_free_rate / config.periods_per_year;
    let excess: Vec<f64> = returns.iter().map(|r| r - per_bar_rf).collect();
    let mean = mean_f64(&excess);
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * config.periods_per_year.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
///
/// Returns 0.0 if there is no downside deviation or fewer than 2 bars.
pub fn sortino_ratio(equity_curve: &[EquityPoint], config: &MetricsConfig) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let per_bar_rf = config.risk_free_rate / config.periods_per_year;
    let excess: Vec<f64> = returns.iter().map(|r| r - per_bar_rf).collect();
    let mean = mean_f64(&excess);

    let downside_sq: Vec<f64> = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).collect();
    if downside_sq.is_empty() {
        return 0.0;
    }
    let downside_std = (downside_sq.iter().sum::<f64>() / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    (mean / downside_std) * config.periods_per_year.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0].equity;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > 0.0 {
            let dd = (point.equity - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Win rate: fraction of trades with positive net P&L.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Mean P&L of winning trades. 0.0 with no winners.
pub fn avg_win(trades: &[Trade]) -> f64 {
    let wins: Vec<f64> = trades
        .iter()
        .filter(|t| t.pnl > 0.0)
        .map(|t| t.pnl)
        .collect();
    mean_f64(&wins)
}

/// Mean P&L of losing trades, as a negative number. 0.0 with no losers.
pub fn avg_loss(trades: &[Trade]) -> f64 {
    let losses: Vec<f64> = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl)
        .collect();
    mean_f64(&losses)
}

/// Profit factor: gross profits / gross losses.
///
/// With winners and zero losses the ratio is genuinely unbounded, so it
/// is reported as `f64::INFINITY` rather than an arbitrary cap. Zero
/// trades (or zero profit with zero loss) report 0.0.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { f64::INFINITY } else { 0.0 };
    }
    gross_profit / gross_loss
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Per-bar simple returns from an equity curve.
pub fn bar_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0].equity > 0.0 {
                (w[1].equity - w[0].equity) / w[0].equity
            } else {
                0.0
            }
        })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

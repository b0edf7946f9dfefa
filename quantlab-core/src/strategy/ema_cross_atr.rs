//! EMA cross strategy with ATR-sized stop and target.
//!
//! Classic 9/21 EMA cross: enter on the cross, exit on the opposite cross.
//! Stop-loss and take-profit are placed at ATR multiples of the entry
//! close, so risk distance adapts to current volatility.

use crate::domain::{Bar, Direction, Position, Signal};
use crate::indicators::{atr, ema};

use super::{Strategy, StrategyError};

#[derive(Debug, Clone)]
pub struct EmaCrossAtr {
    pub fast_period: usize,
    pub slow_period: usize,
    pub atr_period: usize,
    pub atr_stop_mult: f64,
    pub atr_target_mult: f64,
}

impl EmaCrossAtr {
    pub fn new(fast_period: usize, slow_period: usize, atr_period: usize) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );
        assert!(atr_period >= 1, "atr_period must be >= 1");
        Self {
            fast_period,
            slow_period,
            atr_period,
            atr_stop_mult: 2.0,
            atr_target_mult: 3.0,
        }
    }

    /// 9/21 EMA with 14-bar ATR, 2x stop / 3x target.
    pub fn default_params() -> Self {
        Self::new(9, 21, 14)
    }

    pub fn with_multipliers(mut self, stop_mult: f64, target_mult: f64) -> Self {
        assert!(stop_mult > 0.0, "stop multiplier must be positive");
        assert!(target_mult > 0.0, "target multiplier must be positive");
        self.atr_stop_mult = stop_mult;
        self.atr_target_mult = target_mult;
        self
    }
}

impl Strategy for EmaCrossAtr {
    fn name(&self) -> &str {
        "ema_cross_atr"
    }

    fn warmup_bars(&self) -> usize {
        // ATR needs period + 1 bars for its first value.
        self.slow_period.max(self.atr_period + 1)
    }

    fn on_bar(
        &self,
        history: &[Bar],
        position: Option<&Position>,
    ) -> Result<Signal, StrategyError> {
        let i = history.len() - 1;
        if i < self.warmup_bars() {
            return Ok(Signal::Hold);
        }

        let fast = ema(history, self.fast_period);
        let slow = ema(history, self.slow_period);

        let (fast_cur, slow_cur) = (fast[i], slow[i]);
        let (fast_prev, slow_prev) = (fast[i - 1], slow[i - 1]);
        if fast_cur.is_nan() || slow_cur.is_nan() || fast_prev.is_nan() || slow_prev.is_nan() {
            return Ok(Signal::Hold);
        }

        let cross_up = fast_cur > slow_cur && fast_prev <= slow_prev;
        let cross_down = fast_cur < slow_cur && fast_prev >= slow_prev;

        if let Some(pos) = position {
            let exit = match pos.direction {
                Direction::Long => cross_down,
                Direction::Short => cross_up,
            };
            return Ok(if exit { Signal::Exit } else { Signal::Hold });
        }

        if !cross_up && !cross_down {
            return Ok(Signal::Hold);
        }

        let range = atr(history, self.atr_period)[i];
        if range.is_nan() || range <= 0.0 {
            return Err(StrategyError(format!(
                "ATR({}) unavailable at bar {i}",
                self.atr_period
            )));
        }

        let close = history[i].close;
        let signal = if cross_up {
            Signal::EnterLong {
                stop_loss: Some(close - range * self.atr_stop_mult),
                target: Some(close + range * self.atr_target_mult),
            }
        } else {
            Signal::EnterShort {
                stop_loss: Some(close + range * self.atr_stop_mult),
                target: Some(close - range * self.atr_target_mult),
            }
        };
        Ok(signal)
    }
}

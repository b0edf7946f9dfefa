//! Moving average crossover strategy with optional trend filter.
//!
//! Enters long when the fast MA crosses above the slow MA, short on the
//! opposite cross; exits an open position on the opposite cross. A
//! long-period trend MA can gate entries: longs only when the close is
//! above it, shorts only below. Percent stop-loss and take-profit levels
//! are attached to entry signals when configured.

use crate::domain::{Bar, Direction, Position, Signal};
use crate::indicators::{ema, sma};

use super::{Strategy, StrategyError};

/// Moving average type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaType {
    Sma,
    Ema,
}

#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
    pub ma_type: MaType,
    /// Entries must agree with this long MA when set.
    pub trend_filter_period: Option<usize>,
    /// Stop-loss distance as a fraction of entry price.
    pub stop_loss_pct: Option<f64>,
    /// Take-profit distance as a fraction of entry price.
    pub take_profit_pct: Option<f64>,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize, ma_type: MaType) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );
        Self {
            fast_period,
            slow_period,
            ma_type,
            trend_filter_period: None,
            stop_loss_pct: None,
            take_profit_pct: None,
        }
    }

    pub fn with_trend_filter(mut self, period: usize) -> Self {
        assert!(
            period > self.slow_period,
            "trend filter period must exceed slow_period"
        );
        self.trend_filter_period = Some(period);
        self
    }

    pub fn with_risk_levels(
        mut self,
        stop_loss_pct: Option<f64>,
        take_profit_pct: Option<f64>,
    ) -> Self {
        self.stop_loss_pct = stop_loss_pct;
        self.take_profit_pct = take_profit_pct;
        self
    }

    fn compute_ma(&self, history: &[Bar], period: usize) -> Vec<f64> {
        match self.ma_type {
            MaType::Sma => sma(history, period),
            MaType::Ema => ema(history, period),
        }
    }

    fn entry_signal(&self, direction: Direction, close: f64) -> Signal {
        let (stop_loss, target) = match direction {
            Direction::Long => (
                self.stop_loss_pct.map(|p| close * (1.0 - p)),
                self.take_profit_pct.map(|p| close * (1.0 + p)),
            ),
            Direction::Short => (
                self.stop_loss_pct.map(|p| close * (1.0 + p)),
                self.take_profit_pct.map(|p| close * (1.0 - p)),
            ),
        };
        match direction {
            Direction::Long => Signal::EnterLong { stop_loss, target },
            Direction::Short => Signal::EnterShort { stop_loss, target },
        }
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        match self.ma_type {
            MaType::Sma => "sma_crossover",
            MaType::Ema => "ema_crossover",
        }
    }

    fn warmup_bars(&self) -> usize {
        self.slow_period.max(self.trend_filter_period.unwrap_or(0))
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

        let fast = self.compute_ma(history, self.fast_period);
        let slow = self.compute_ma(history, self.slow_period);

        let (fast_cur, slow_cur) = (fast[i], slow[i]);
        let (fast_prev, slow_prev) = (fast[i - 1], slow[i - 1]);
        if fast_cur.is_nan() || slow_cur.is_nan() || fast_prev.is_nan() || slow_prev.is_nan() {
            return Ok(Signal::Hold);
        }

        let cross_up = fast_cur > slow_cur && fast_prev <= slow_prev;
        let cross_down = fast_cur < slow_cur && fast_prev >= slow_prev;

        // Open position: the opposite cross is the exit signal.
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

        let close = history[i].close;
        let direction = if cross_up {
            Direction::Long
        } else {
            Direction::Short
        };

        // Trend filter: entries must agree with the long MA.
        if let Some(period) = self.trend_filter_period {
            let trend = self.compute_ma(history, period);
            let trend_cur = trend[i];
            if trend_cur.is_nan() {
                return Ok(Signal::Hold);
            }
            let aligned = match direction {
                Direction::Long => close > trend_cur,
                Direction::Short => close < trend_cur,
            };
            if !aligned {
                return Ok(Signal::Hold);
            }
        }

        Ok(self.entry_signal(direction, close))
    }
}

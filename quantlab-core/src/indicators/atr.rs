//! Average True Range (ATR) with Wilder smoothing.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR seed at index `period`: mean of TR[1..=period]; then
//! ATR[t] = (ATR[t-1] * (period-1) + TR[t]) / period.

use crate::domain::Bar;

/// True Range series. TR[0] = high[0] - low[0] (no previous close).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];
    if n == 0 {
        return tr;
    }

    tr[0] = bars[0].high - bars[0].low;
    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }
    tr
}

pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    assert!(period >= 1, "ATR period must be >= 1");

    let n = bars.len();
    let mut result = vec![f64::NAN; n];
    if n <= period {
        return result;
    }

    let tr = true_range(bars);

    // Seed from TR[1..=period] — TR[0] lacks a previous close.
    let seed: f64 = tr[1..=period].iter().sum::<f64>() / period as f64;
    result[period] = seed;

    let mut prev = seed;
    for i in (period + 1)..n {
        let value = (prev * (period as f64 - 1.0) + tr[i]) / period as f64;
        result[i] = value;
        prev = value;
    }

    result
}

//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1],
//! alpha = 2 / (period + 1). Seed: SMA of the first `period` closes.

use crate::domain::Bar;

pub fn ema(bars: &[Bar], period: usize) -> Vec<f64> {
    assert!(period >= 1, "EMA period must be >= 1");

    let n = bars.len();
    let mut result = vec![f64::NAN; n];
    if n < period {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    let seed: f64 = bars.iter().take(period).map(|b| b.close).sum::<f64>() / period as f64;
    result[period - 1] = seed;

    let mut prev = seed;
    for i in period..n {
        let value = alpha * bars[i].close + (1.0 - alpha) * prev;
        result[i] = value;
        prev = value;
    }

    result
}

//! Indicator functions used by the bundled strategies.
//!
//! Each is a pure function over a bar slice, returning one value per input
//! bar with a NaN prefix until the lookback window is filled. Strategies
//! call these on the bounded history slice the engine hands them, so an
//! indicator value can never incorporate a future bar.

pub mod atr;
pub mod ema;
pub mod sma;

pub use atr::{atr, true_range};
pub use ema::ema;
pub use sma::sma;

/// Create synthetic bars from close prices for testing.
///
/// open = prev close (or close for the first bar), high/low bracket them
/// by 1.0, minute-spaced timestamps.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: start + chrono::Duration::minutes(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "expected {expected}, got {actual}"
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-9;

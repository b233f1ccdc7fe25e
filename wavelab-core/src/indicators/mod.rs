//! Concrete indicator implementations.
//!
//! Every indicator exists in two shapes:
//! - a `*_of_series` function over a pre-extracted `&[f64]`, used when one
//!   indicator feeds another (MACD signal line, WaveTrend stages, ATR);
//! - a struct implementing `Indicator`, used for single-column computation
//!   and the look-ahead test suite.
//!
//! Multi-series indicators (MACD, Bollinger, WaveTrend, Nadaraya-Watson) also
//! expose a function returning all lines at once, so the pipeline computes
//! them in a single pass.
//!
//! Undefined values are `f64::NAN` throughout. Insufficient history never
//! panics or errors; it yields NaN.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod nadaraya_watson;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod wavetrend;

pub use atr::{atr_of_bars, true_range, Atr};
pub use bollinger::{bollinger_bands, Bollinger, BollingerBand, BollingerBands};
pub use ema::{ema_of_series, Ema};
pub use macd::{macd_of_series, Macd, MacdLine, MacdLines};
pub use nadaraya_watson::{nadaraya_watson, KernelMode, NadarayaWatson, NwBand, NwBands};
pub use rolling::{rolling_max, rolling_min, rolling_std};
pub use rsi::{rsi_of_series, Rsi};
pub use sma::{sma_of_series, Sma};
pub use wavetrend::{wavetrend, WaveTrend, WaveTrendLine, WaveTrendLines};

/// Clamp `x` into `[lo, hi]`, passing NaN through.
pub fn clip(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        x
    } else {
        x.max(lo).min(hi)
    }
}

/// Create synthetic bars from close prices for testing.
///
/// One bar per minute from 2024-01-02 00:00. open = prev_close (or close for
/// the first bar), high = max(open, close) * 1.01, low = min(open, close) * 0.99,
/// volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: start + chrono::Duration::minutes(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

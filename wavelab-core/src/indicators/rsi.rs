//! Relative Strength Index (RSI).
//!
//! Simple trailing averages of gains and losses over the last `period`
//! first differences (not Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period (the first difference needs one extra bar).
//! Edge cases: both averages 0 → 50; avg_loss 0 → 100; avg_gain 0 → 0.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rsi_of_series(&closes, self.period)
    }
}

/// RSI over an arbitrary series.
pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    let changes: Vec<f64> = (0..n)
        .map(|i| {
            if i == 0 {
                f64::NAN
            } else {
                values[i] - values[i - 1]
            }
        })
        .collect();

    for i in period..n {
        let window = &changes[i + 1 - period..=i];
        if window.iter().any(|c| c.is_nan()) {
            continue;
        }
        let mut gain = 0.0;
        let mut loss = 0.0;
        for &ch in window {
            if ch > 0.0 {
                gain += ch;
            } else {
                loss -= ch;
            }
        }
        result[i] = rsi_from_averages(gain / period as f64, loss / period as f64);
    }

    result
}

pub(crate) fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = Rsi::new(14).compute(&make_bars(&closes));
        for v in result.iter().take(14) {
            assert!(v.is_nan());
        }
        for v in result.iter().skip(14) {
            assert_approx(*v, 100.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let result = rsi_of_series(&closes, 14);
        assert_approx(result[19], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_flat_is_50() {
        let result = rsi_of_series(&[100.0; 30], 14);
        assert!(result[13].is_nan());
        for v in result.iter().skip(14) {
            assert_approx(*v, 50.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rsi_known_value() {
        // period 2, changes at index 2: [+2, -1] → avg_gain 1, avg_loss 0.5 → RS 2
        // RSI = 100 - 100/3
        let result = rsi_of_series(&[10.0, 12.0, 11.0], 2);
        assert_approx(result[2], 100.0 - 100.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_insufficient_history_is_all_nan() {
        let result = rsi_of_series(&[1.0; 14], 14);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_bounded() {
        let closes: Vec<f64> = (0..100)
            .map(|i| 100.0 + ((i * 37) % 11) as f64 - 5.0)
            .collect();
        for v in rsi_of_series(&closes, 14).iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}

//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: the first defined input value.
//! Output starts once `period` defined inputs have been consumed, so the
//! lookback is period - 1 on a fully defined series.
//!
//! Undefined inputs are skipped: the output at that index is NaN and the
//! recursion state carries over unchanged. This lets EMA run over series that
//! themselves have a warmup prefix (WaveTrend's `ci`, the MACD line).

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.period)
    }
}

/// EMA over an arbitrary series.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev: Option<f64> = None;
    let mut consumed = 0usize;

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        let ema = match prev {
            Some(p) => alpha * v + (1.0 - alpha) * p,
            None => v,
        };
        prev = Some(ema);
        consumed += 1;
        if consumed >= period {
            result[i] = ema;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_equals_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Ema::new(1).compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // Closes: 10, 11, 12, 13, 14
        // alpha = 2/(3+1) = 0.5, seed = 10
        // state: 10, 10.5, 11.25, 12.125, 13.0625
        // emitted from index 2 (third defined value)
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Ema::new(3).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
        assert_approx(result[3], 12.125, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0625, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_insufficient_history_is_all_nan() {
        let result = ema_of_series(&[1.0, 2.0, 3.0], 5);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ema_skips_leading_nan() {
        // Warmup prefix of an upstream indicator.
        let result = ema_of_series(&[f64::NAN, f64::NAN, 10.0, 11.0, 12.0], 2);
        assert!(result[2].is_nan());
        // alpha = 2/3; 10 -> 2/3*11 + 1/3*10 = 10.666..
        assert_approx(result[3], 32.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[4], 2.0 / 3.0 * 12.0 + 1.0 / 3.0 * (32.0 / 3.0), DEFAULT_EPSILON);
    }

    #[test]
    fn ema_interior_nan_holds_state() {
        let result = ema_of_series(&[10.0, 10.0, f64::NAN, 13.0], 2);
        assert_approx(result[1], 10.0, DEFAULT_EPSILON);
        assert!(result[2].is_nan());
        // alpha = 2/3: 2/3*13 + 1/3*10 = 12
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_lookback() {
        assert_eq!(Ema::new(20).lookback(), 19);
        assert_eq!(Ema::new(1).lookback(), 0);
    }

    #[test]
    fn ema_of_series_matches_indicator() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let indicator_result = Ema::new(3).compute(&bars);
        let series_result = ema_of_series(&closes, 3);
        for i in 0..6 {
            if indicator_result[i].is_nan() {
                assert!(series_result[i].is_nan());
            } else {
                assert_approx(indicator_result[i], series_result[i], DEFAULT_EPSILON);
            }
        }
    }

    #[test]
    fn longer_period_lags_more_on_step() {
        // Step from 0 to 100 at bar 60; measure bars until EMA crosses 50.
        let mut values = vec![0.0; 60];
        values.extend(std::iter::repeat(100.0).take(200));
        let first_half = |period: usize| {
            ema_of_series(&values, period)
                .iter()
                .position(|v| !v.is_nan() && *v >= 50.0)
                .unwrap()
        };
        assert!(first_half(50) > first_half(10));
    }
}

//! Trailing-window statistics: population stddev, min, max.
//!
//! All three are undefined for index < period-1 and for any window that
//! contains an undefined value.

fn rolling<F>(values: &[f64], period: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = f(window);
    }

    result
}

/// Population standard deviation (divide by N).
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let variance = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / w.len() as f64;
        variance.sqrt()
    })
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn std_known_value() {
        // Population std of [2, 4, 4, 4, 5, 5, 7, 9] = 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let result = rolling_std(&values, 8);
        assert!(result[6].is_nan());
        assert_approx(result[7], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn std_of_constant_is_zero() {
        let result = rolling_std(&[5.0; 10], 4);
        assert_approx(result[9], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn min_max_windows() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0];
        let lo = rolling_min(&values, 3);
        let hi = rolling_max(&values, 3);
        assert!(lo[1].is_nan());
        assert_eq!(lo[2], 1.0);
        assert_eq!(hi[2], 4.0);
        assert_eq!(lo[6], 2.0);
        assert_eq!(hi[6], 9.0);
    }

    #[test]
    fn nan_in_window() {
        let result = rolling_max(&[1.0, f64::NAN, 3.0, 4.0], 2);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_eq!(result[3], 4.0);
    }

    #[test]
    fn insufficient_history() {
        assert!(rolling_min(&[1.0], 2).iter().all(|v| v.is_nan()));
    }
}

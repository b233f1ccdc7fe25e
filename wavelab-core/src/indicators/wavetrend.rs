//! WaveTrend oscillator.
//!
//! 1. ap  = (high + low + close) / 3
//! 2. esa = EMA(ap, channel_len)
//! 3. d   = EMA(|ap - esa|, channel_len)
//! 4. ci  = (ap - esa) / (0.015 * d), undefined where d is 0 or undefined
//! 5. wt1 = EMA(ci, average_len); wt2 = SMA(wt1, 4)
//!
//! A perfectly flat series has d == 0 everywhere, so wt1/wt2 stay undefined
//! and no crossover can ever fire on it.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::ema::ema_of_series;
use super::sma::sma_of_series;

/// Normalization constant of the channel index.
pub const CI_SCALE: f64 = 0.015;

/// Window of the slow line (`wt2 = SMA(wt1, 4)`).
pub const SIGNAL_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveTrendLine {
    Fast,
    Slow,
}

#[derive(Debug, Clone)]
pub struct WaveTrendLines {
    pub wt1: Vec<f64>,
    pub wt2: Vec<f64>,
}

pub fn wavetrend(bars: &[Bar], channel_len: usize, average_len: usize) -> WaveTrendLines {
    let ap: Vec<f64> = bars.iter().map(|b| b.typical_price()).collect();
    let esa = ema_of_series(&ap, channel_len);
    let deviation: Vec<f64> = ap.iter().zip(&esa).map(|(a, e)| (a - e).abs()).collect();
    let d = ema_of_series(&deviation, channel_len);

    let ci: Vec<f64> = ap
        .iter()
        .zip(&esa)
        .zip(&d)
        .map(|((a, e), d)| {
            if d.is_nan() || *d == 0.0 {
                f64::NAN
            } else {
                (a - e) / (CI_SCALE * d)
            }
        })
        .collect();

    let wt1 = ema_of_series(&ci, average_len);
    let wt2 = sma_of_series(&wt1, SIGNAL_LEN);
    WaveTrendLines { wt1, wt2 }
}

#[derive(Debug, Clone)]
pub struct WaveTrend {
    channel_len: usize,
    average_len: usize,
    line: WaveTrendLine,
    name: String,
}

impl WaveTrend {
    pub fn new(channel_len: usize, average_len: usize, line: WaveTrendLine) -> Self {
        assert!(channel_len >= 1, "WaveTrend channel_len must be >= 1");
        assert!(average_len >= 1, "WaveTrend average_len must be >= 1");
        let label = match line {
            WaveTrendLine::Fast => "wt1",
            WaveTrendLine::Slow => "wt2",
        };
        Self {
            channel_len,
            average_len,
            line,
            name: format!("{label}_{channel_len}_{average_len}"),
        }
    }
}

impl Indicator for WaveTrend {
    fn name(&self) -> &str {
        &self.name
    }

    /// esa and d each need `channel_len` values; wt1 then needs
    /// `average_len` defined ci values; wt2 adds `SIGNAL_LEN - 1`.
    fn lookback(&self) -> usize {
        let wt1 = 2 * (self.channel_len - 1) + (self.average_len - 1);
        match self.line {
            WaveTrendLine::Fast => wt1,
            WaveTrendLine::Slow => wt1 + SIGNAL_LEN - 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let lines = wavetrend(bars, self.channel_len, self.average_len);
        match self.line {
            WaveTrendLine::Fast => lines.wt1,
            WaveTrendLine::Slow => lines.wt2,
        }
    }
}

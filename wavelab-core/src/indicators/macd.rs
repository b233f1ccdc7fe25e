//! Moving Average Convergence/Divergence (MACD).
//!
//! macd = EMA(fast) - EMA(slow); signal = EMA(signal) of the macd line;
//! histogram = macd - signal. The signal EMA skips the macd warmup prefix.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::ema::ema_of_series;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd_of_series(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdLines {
    let fast_ema = ema_of_series(values, fast);
    let slow_ema = ema_of_series(values, slow);
    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_of_series(&macd, signal);
    let histogram = macd
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();
    MacdLines {
        macd,
        signal: signal_line,
        histogram,
    }
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(slow > fast, "MACD slow period must be > fast period");
        let label = match line {
            MacdLine::Macd => "macd",
            MacdLine::Signal => "macd_signal",
            MacdLine::Histogram => "macd_hist",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("{label}_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let lines = macd_of_series(&closes, self.fast, self.slow, self.signal);
        match self.line {
            MacdLine::Macd => lines.macd,
            MacdLine::Signal => lines.signal,
            MacdLine::Histogram => lines.histogram,
        }
    }
}

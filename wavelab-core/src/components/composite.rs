//! Trend-strength composite.
//!
//! Blends EMA alignment, RSI and WaveTrend into one score in [0, 1]:
//!
//! ```text
//! ema_score = w1·[ema_fast > ema_mid] + w2·[ema_mid > ema_slow] + w3·[close > ema_fast]
//! rsi_score = (clip((rsi - 50) / 50, -1, 1) + 1) / 2
//! wt_score  = clip((wt1 + 100) / 200, 0, 1)
//! strength  = clip(w_ema·ema_score + w_rsi·rsi_score + w_wt·wt_score, 0, 1)
//! ```
//!
//! Undefined whenever any input is undefined.

use super::indicator::{col, FrameError, IndicatorFrame};
use crate::indicators::clip;
use crate::params::{IndicatorParams, TrendWeights};

/// Inputs of the composite at a single bar.
#[derive(Debug, Clone, Copy)]
pub struct TrendInputs {
    pub close: f64,
    pub ema_fast: f64,
    pub ema_mid: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub wt1: f64,
}

impl TrendInputs {
    fn is_defined(&self) -> bool {
        [
            self.close,
            self.ema_fast,
            self.ema_mid,
            self.ema_slow,
            self.rsi,
            self.wt1,
        ]
        .iter()
        .all(|v| !v.is_nan())
    }
}

fn indicator(cond: bool) -> f64 {
    if cond {
        1.0
    } else {
        0.0
    }
}

pub fn trend_strength_at(inputs: &TrendInputs, weights: &TrendWeights) -> f64 {
    if !inputs.is_defined() {
        return f64::NAN;
    }
    let ema_score = weights.fast_above_mid * indicator(inputs.ema_fast > inputs.ema_mid)
        + weights.mid_above_slow * indicator(inputs.ema_mid > inputs.ema_slow)
        + weights.close_above_fast * indicator(inputs.close > inputs.ema_fast);
    let rsi_score = (clip((inputs.rsi - 50.0) / 50.0, -1.0, 1.0) + 1.0) / 2.0;
    let wt_score = clip((inputs.wt1 + 100.0) / 200.0, 0.0, 1.0);
    clip(
        weights.ema * ema_score + weights.rsi * rsi_score + weights.wavetrend * wt_score,
        0.0,
        1.0,
    )
}

/// Compute the composite for every bar of a frame that already holds the
/// EMA, RSI and WaveTrend columns.
pub fn trend_strength(
    frame: &IndicatorFrame,
    indicators: &IndicatorParams,
    weights: &TrendWeights,
) -> Result<Vec<f64>, FrameError> {
    let close = frame.require(col::CLOSE)?;
    let ema_fast = frame.require(&indicators.ema_fast_key())?;
    let ema_mid = frame.require(&indicators.ema_mid_key())?;
    let ema_slow = frame.require(&indicators.ema_slow_key())?;
    let rsi = frame.require(col::RSI)?;
    let wt1 = frame.require(col::WT1)?;

    Ok((0..frame.len())
        .map(|i| {
            trend_strength_at(
                &TrendInputs {
                    close: close[i],
                    ema_fast: ema_fast[i],
                    ema_mid: ema_mid[i],
                    ema_slow: ema_slow[i],
                    rsi: rsi[i],
                    wt1: wt1[i],
                },
                weights,
            )
        })
        .collect())
}

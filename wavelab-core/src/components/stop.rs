//! Dynamic stop-loss.
//!
//! `stop = -clip(atr_multiplier · (atr / price) · (1 + (1 - trend_strength)), floor, ceiling)`
//!
//! Weak trends widen the stop. The result is always negative (a fractional
//! loss from entry). When any input is unusable the widest allowed loss,
//! `-ceiling`, is returned.

use super::indicator::{col, FrameError, IndicatorFrame, IndicatorRow};
use crate::indicators::clip;
use crate::params::StopParams;

pub fn dynamic_stop(atr: f64, price: f64, trend_strength: f64, params: &StopParams) -> f64 {
    if atr.is_nan() || atr < 0.0 || trend_strength.is_nan() || price.is_nan() || price <= 0.0 {
        return -params.ceiling;
    }
    let trend = clip(trend_strength, 0.0, 1.0);
    let raw = params.atr_multiplier * (atr / price) * (1.0 + (1.0 - trend));
    -clip(raw, params.floor, params.ceiling)
}

/// Stop for the bar described by `row`, priced at `current_price`.
pub fn stop_from_row(row: &IndicatorRow, current_price: f64, params: &StopParams) -> f64 {
    dynamic_stop(
        row.value(col::ATR),
        current_price,
        row.value(col::TREND_STRENGTH),
        params,
    )
}

/// Stop at every bar, priced at that bar's close.
pub fn stop_column(frame: &IndicatorFrame, params: &StopParams) -> Result<Vec<f64>, FrameError> {
    let atr = frame.require(col::ATR)?;
    let close = frame.require(col::CLOSE)?;
    let trend = frame.require(col::TREND_STRENGTH)?;
    Ok((0..frame.len())
        .map(|i| dynamic_stop(atr[i], close[i], trend[i], params))
        .collect())
}

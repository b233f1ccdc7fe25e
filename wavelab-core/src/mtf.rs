//! Multi-timeframe confirmation.
//!
//! The entry series (finest timeframe) is resampled into the momentum,
//! medium and long timeframes and the full indicator pipeline runs on each.
//! For every entry bar, each coarser timeframe contributes its last *closed*
//! bucket: the latest bucket whose end is at or before the entry bar's close.
//! A partially formed bucket is never read.
//!
//! | role      | default | condition                                    |
//! |-----------|---------|----------------------------------------------|
//! | long      | 1h      | ema_fast > ema_mid and trend_strength > min  |
//! | medium    | 15m     | ema_fast > ema_mid and trend_strength > min  |
//! | momentum  | 5m      | macd > 0 and rsi > min                       |
//! | precise   | 1m      | rsi < max, on the entry bar itself           |
//!
//! Entry needs all four. Exit fires when any role deteriorates
//! (`ema_fast < ema_mid` or `trend_strength < exit.trend_floor`). An undefined
//! role suppresses both.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::components::indicator::{col, FrameError, IndicatorFrame};
use crate::domain::{resample, PriceSeries, ResampleError, Timeframe};
use crate::params::StrategyParameters;
use crate::pipeline::compute_indicators;

#[derive(Debug, Error)]
pub enum MtfError {
    #[error("series is {actual}, multi-timeframe entry timeframe is {expected}")]
    EntryTimeframe {
        expected: Timeframe,
        actual: Timeframe,
    },

    #[error(transparent)]
    Resample(#[from] ResampleError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MtfRole {
    Long,
    Medium,
    Momentum,
    Precise,
}

/// One role's reading at one entry bar. `None` fields are undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RoleReading {
    condition: Option<bool>,
    deteriorating: Option<bool>,
}

impl RoleReading {
    const UNDEFINED: RoleReading = RoleReading {
        condition: None,
        deteriorating: None,
    };

    fn is_defined(&self) -> bool {
        self.condition.is_some() && self.deteriorating.is_some()
    }
}

/// Cross-timeframe verdict for one entry bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MtfEvaluation {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub long_trend: Option<bool>,
    pub medium_trend: Option<bool>,
    pub momentum: Option<bool>,
    pub precise: Option<bool>,
    /// Every role's inputs were defined at this bar.
    pub defined: bool,
    pub enter_long: bool,
    pub exit_long: bool,
}

impl MtfEvaluation {
    pub fn role(&self, role: MtfRole) -> Option<bool> {
        match role {
            MtfRole::Long => self.long_trend,
            MtfRole::Medium => self.medium_trend,
            MtfRole::Momentum => self.momentum,
            MtfRole::Precise => self.precise,
        }
    }

    /// All four role conditions hold.
    pub fn roles_aligned(&self) -> bool {
        [
            self.long_trend,
            self.medium_trend,
            self.momentum,
            self.precise,
        ]
        .iter()
        .all(|r| *r == Some(true))
    }
}

/// A coarser timeframe's frame plus its bucket start times.
struct RoleFrame {
    timeframe: Timeframe,
    starts: Vec<NaiveDateTime>,
    frame: IndicatorFrame,
}

impl RoleFrame {
    fn build(entry: &PriceSeries, timeframe: Timeframe, params: &StrategyParameters) -> Result<Self, MtfError> {
        let series = resample(entry, timeframe)?;
        let frame = compute_indicators(&series, params)?;
        let starts = series.bars().iter().map(|b| b.timestamp).collect();
        debug!(timeframe = %timeframe, buckets = series.len(), "role timeframe computed");
        Ok(Self {
            timeframe,
            starts,
            frame,
        })
    }

    /// Index of the last bucket closed by `close_time`, if any.
    fn last_closed(&self, close_time: NaiveDateTime) -> Option<usize> {
        self.starts
            .partition_point(|s| self.timeframe.bucket_end(*s) <= close_time)
            .checked_sub(1)
    }
}

fn value(frame: &IndicatorFrame, name: &str, i: usize) -> Option<f64> {
    frame.get(name, i).filter(|v| !v.is_nan())
}

fn deterioration(frame: &IndicatorFrame, i: usize, params: &StrategyParameters) -> Option<bool> {
    let fast = value(frame, &params.indicators.ema_fast_key(), i)?;
    let mid = value(frame, &params.indicators.ema_mid_key(), i)?;
    let ts = value(frame, col::TREND_STRENGTH, i)?;
    Some(fast < mid || ts < params.exit.trend_floor)
}

fn trend_reading(frame: &IndicatorFrame, i: usize, min: f64, params: &StrategyParameters) -> RoleReading {
    let condition = (|| {
        let fast = value(frame, &params.indicators.ema_fast_key(), i)?;
        let mid = value(frame, &params.indicators.ema_mid_key(), i)?;
        let ts = value(frame, col::TREND_STRENGTH, i)?;
        Some(fast > mid && ts > min)
    })();
    RoleReading {
        condition,
        deteriorating: deterioration(frame, i, params),
    }
}

fn momentum_reading(frame: &IndicatorFrame, i: usize, params: &StrategyParameters) -> RoleReading {
    let condition = (|| {
        let macd = value(frame, col::MACD, i)?;
        let rsi = value(frame, col::RSI, i)?;
        Some(macd > 0.0 && rsi > params.mtf.momentum_rsi_min)
    })();
    RoleReading {
        condition,
        deteriorating: deterioration(frame, i, params),
    }
}

fn precise_reading(frame: &IndicatorFrame, i: usize, params: &StrategyParameters) -> RoleReading {
    RoleReading {
        condition: value(frame, col::RSI, i).map(|rsi| rsi < params.mtf.precise_rsi_max),
        deteriorating: deterioration(frame, i, params),
    }
}

/// Evaluate multi-timeframe confirmation for every bar of `series`.
///
/// `series` must be on `params.mtf.entry`.
pub fn compute_mtf(series: &PriceSeries, params: &StrategyParameters) -> Result<Vec<MtfEvaluation>, MtfError> {
    let mtf = &params.mtf;
    if series.timeframe() != mtf.entry {
        return Err(MtfError::EntryTimeframe {
            expected: mtf.entry,
            actual: series.timeframe(),
        });
    }

    let entry_frame = compute_indicators(series, params)?;
    let long = RoleFrame::build(series, mtf.long, params)?;
    let medium = RoleFrame::build(series, mtf.medium, params)?;
    let momentum = RoleFrame::build(series, mtf.momentum, params)?;

    let entry_step = series.timeframe().duration();
    let evaluations: Vec<MtfEvaluation> = series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let close_time = bar.timestamp + entry_step;
            let read = |role: &RoleFrame, f: &dyn Fn(&IndicatorFrame, usize) -> RoleReading| {
                role.last_closed(close_time)
                    .map_or(RoleReading::UNDEFINED, |k| f(&role.frame, k))
            };

            let long_r = read(&long, &|frame, k| trend_reading(frame, k, mtf.long_trend_min, params));
            let medium_r = read(&medium, &|frame, k| {
                trend_reading(frame, k, mtf.medium_trend_min, params)
            });
            let momentum_r = read(&momentum, &|frame, k| momentum_reading(frame, k, params));
            let precise_r = precise_reading(&entry_frame, i, params);

            let readings = [long_r, medium_r, momentum_r, precise_r];
            let defined = readings.iter().all(RoleReading::is_defined);
            let enter_long = defined && readings.iter().all(|r| r.condition == Some(true));
            let exit_long = defined && readings.iter().any(|r| r.deteriorating == Some(true));

            MtfEvaluation {
                bar_index: i,
                timestamp: bar.timestamp,
                long_trend: long_r.condition,
                medium_trend: medium_r.condition,
                momentum: momentum_r.condition,
                precise: precise_r.condition,
                defined,
                enter_long,
                exit_long,
            }
        })
        .collect();

    debug!(
        bars = evaluations.len(),
        entries = evaluations.iter().filter(|e| e.enter_long).count(),
        exits = evaluations.iter().filter(|e| e.exit_long).count(),
        "multi-timeframe evaluation done"
    );
    Ok(evaluations)
}

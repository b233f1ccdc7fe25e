//! Indicator precomputation.
//!
//! Every indicator is computed once, in stage order, into a single
//! `IndicatorFrame`. Later stages read earlier columns through
//! `IndicatorFrame::require`, so a stage that runs out of order fails with
//! `FrameError::MissingColumn` instead of reading garbage.
//!
//! Stages:
//! 1. source columns (close, high, low, volume)
//! 2. EMAs (fast/mid/slow and the MACD pair)
//! 3. RSI, MACD
//! 4. Bollinger bands
//! 5. ATR, close stddev, rolling low/high
//! 6. volume SMA and ratio
//! 7. WaveTrend
//! 8. Nadaraya-Watson estimate and bands
//! 9. trend-strength composite, price position

use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::components::composite::trend_strength;
use crate::components::filter::{price_position_of_series, volume_ratio_of_series};
use crate::components::indicator::{col, FrameError, Indicator, IndicatorFrame};
use crate::domain::PriceSeries;
use crate::indicators::{
    atr_of_bars, bollinger_bands, ema_of_series, macd_of_series, nadaraya_watson, rolling_max,
    rolling_min, rolling_std, rsi_of_series, sma_of_series, wavetrend, Atr, Bollinger,
    BollingerBand, Ema, Macd, MacdLine, NadarayaWatson, NwBand, Rsi, WaveTrend, WaveTrendLine,
};
use crate::params::StrategyParameters;

/// Compute every indicator column for `series`.
pub fn compute_indicators(
    series: &PriceSeries,
    params: &StrategyParameters,
) -> Result<IndicatorFrame, FrameError> {
    let bars = series.bars();
    let ind = &params.indicators;
    let mut frame = IndicatorFrame::new(bars.len());

    let close = series.closes();
    let highs = series.highs();
    let lows = series.lows();
    let volumes = series.volumes();
    frame.insert(col::CLOSE, close.clone())?;
    frame.insert(col::HIGH, highs.clone())?;
    frame.insert(col::LOW, lows.clone())?;
    frame.insert(col::VOLUME, volumes.clone())?;

    let ema_periods: BTreeSet<usize> = [
        ind.ema_fast,
        ind.ema_mid,
        ind.ema_slow,
        ind.macd_fast,
        ind.macd_slow,
    ]
    .into_iter()
    .collect();
    for period in ema_periods {
        frame.insert(col::ema(period), ema_of_series(&close, period))?;
    }
    trace!(stage = "moving_averages", "stage done");

    frame.insert(col::RSI, rsi_of_series(&close, ind.rsi_period))?;
    let macd = macd_of_series(&close, ind.macd_fast, ind.macd_slow, ind.macd_signal);
    frame.insert(col::MACD, macd.macd)?;
    frame.insert(col::MACD_SIGNAL, macd.signal)?;
    frame.insert(col::MACD_HIST, macd.histogram)?;
    trace!(stage = "momentum", "stage done");

    let bb = bollinger_bands(&close, ind.bb_period, ind.bb_std);
    frame.insert(col::BB_UPPER, bb.upper)?;
    frame.insert(col::BB_MIDDLE, bb.middle)?;
    frame.insert(col::BB_LOWER, bb.lower)?;

    let filters = &params.filters;
    frame.insert(col::ATR, atr_of_bars(bars, ind.atr_period))?;
    frame.insert(col::STD_CLOSE, rolling_std(&close, ind.std_period))?;
    frame.insert(col::ROLLING_LOW, rolling_min(&lows, filters.position_window))?;
    frame.insert(col::ROLLING_HIGH, rolling_max(&highs, filters.position_window))?;
    trace!(stage = "range", "stage done");

    let volume_sma = sma_of_series(&volumes, filters.volume_window);
    frame.insert(col::VOLUME_RATIO, volume_ratio_of_series(&volumes, &volume_sma))?;
    frame.insert(col::VOLUME_SMA, volume_sma)?;

    let wt = wavetrend(bars, params.wavetrend.channel_len, params.wavetrend.average_len);
    frame.insert(col::WT1, wt.wt1)?;
    frame.insert(col::WT2, wt.wt2)?;

    let k = &params.kernel;
    let nw = nadaraya_watson(&close, k.bandwidth, k.lookback, k.std_multiplier, k.mode);
    frame.insert(col::NW_ESTIMATE, nw.estimate)?;
    frame.insert(col::NW_UPPER, nw.upper)?;
    frame.insert(col::NW_LOWER, nw.lower)?;
    trace!(stage = "oscillators", "stage done");

    let ts = trend_strength(&frame, ind, &params.trend_weights)?;
    frame.insert(col::TREND_STRENGTH, ts)?;
    let pp = price_position_of_series(
        frame.require(col::CLOSE)?,
        frame.require(col::ROLLING_LOW)?,
        frame.require(col::ROLLING_HIGH)?,
    );
    frame.insert(col::PRICE_POSITION, pp)?;

    debug!(
        pair = series.pair(),
        timeframe = %series.timeframe(),
        bars = frame.len(),
        columns = frame.column_count(),
        "indicators computed"
    );
    Ok(frame)
}

/// The single-column indicators behind the frame, as trait objects.
///
/// Used for warmup computation and the look-ahead test suite.
pub fn indicator_set(params: &StrategyParameters) -> Vec<Box<dyn Indicator>> {
    let ind = &params.indicators;
    let wt = &params.wavetrend;
    let k = &params.kernel;
    vec![
        Box::new(Ema::new(ind.ema_fast)),
        Box::new(Ema::new(ind.ema_mid)),
        Box::new(Ema::new(ind.ema_slow)),
        Box::new(Rsi::new(ind.rsi_period)),
        Box::new(Macd::new(ind.macd_fast, ind.macd_slow, ind.macd_signal, MacdLine::Macd)),
        Box::new(Macd::new(ind.macd_fast, ind.macd_slow, ind.macd_signal, MacdLine::Signal)),
        Box::new(Bollinger::new(ind.bb_period, ind.bb_std, BollingerBand::Upper)),
        Box::new(Atr::new(ind.atr_period)),
        Box::new(WaveTrend::new(wt.channel_len, wt.average_len, WaveTrendLine::Fast)),
        Box::new(WaveTrend::new(wt.channel_len, wt.average_len, WaveTrendLine::Slow)),
        Box::new(NadarayaWatson::new(
            k.bandwidth,
            k.lookback,
            k.std_multiplier,
            k.mode,
            NwBand::Upper,
        )),
    ]
}

/// Compute the warmup length from a set of indicators.
///
/// The warmup is the maximum lookback across all indicators. No entry can
/// fire during the warmup period.
pub fn compute_warmup(indicators: &[Box<dyn Indicator>]) -> usize {
    indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
}

/// Warmup of the full pipeline under `params`.
pub fn warmup(params: &StrategyParameters) -> usize {
    compute_warmup(&indicator_set(params))
}

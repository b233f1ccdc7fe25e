//! Long exit fusion.
//!
//! Exit clauses are checked in a fixed priority order; the first that fires
//! supplies the tag. An undefined input anywhere in the row suppresses the exit.

use tracing::debug;

use super::crossover::bearish_crossovers;
use super::{ExitColumn, ExitTag};
use crate::components::indicator::{col, FrameError, IndicatorFrame};
use crate::params::{ExitParams, StrategyParameters};

/// The row of values the exit rule reads at one bar.
#[derive(Debug, Clone, Copy)]
pub struct ExitInputs {
    pub bearish_cross: bool,
    pub close: f64,
    pub rsi: f64,
    pub trend_strength: f64,
    pub ema_fast: f64,
    pub nw_upper: f64,
    pub volume_ratio: f64,
    pub price_position: f64,
}

impl ExitInputs {
    fn is_defined(&self) -> bool {
        [
            self.close,
            self.rsi,
            self.trend_strength,
            self.ema_fast,
            self.nw_upper,
            self.volume_ratio,
            self.price_position,
        ]
        .iter()
        .all(|v| !v.is_nan())
    }
}

/// First exit clause that fires, or `None`.
pub fn exit_tag_at(inputs: &ExitInputs, params: &ExitParams) -> Option<ExitTag> {
    if !inputs.is_defined() {
        return None;
    }
    let clauses = [
        (inputs.bearish_cross, ExitTag::WtBearishCross),
        (inputs.rsi > params.rsi_exit_ceiling, ExitTag::RsiOverbought),
        (
            inputs.trend_strength < params.trend_floor,
            ExitTag::TrendDeterioration,
        ),
        (
            inputs.close > inputs.ema_fast * (1.0 + params.profit_margin),
            ExitTag::ProfitTarget,
        ),
        (
            inputs.close >= inputs.nw_upper && inputs.rsi > params.mid_rsi,
            ExitTag::NwResistance,
        ),
        (inputs.volume_ratio > params.volume_spike, ExitTag::VolumeSpike),
        (
            inputs.price_position > params.resistance_ceiling && inputs.rsi > params.mid_rsi,
            ExitTag::PriceAtResistance,
        ),
    ];
    clauses
        .into_iter()
        .find_map(|(fired, tag)| fired.then_some(tag))
}

pub fn compute_exit(frame: &IndicatorFrame, params: &StrategyParameters) -> Result<ExitColumn, FrameError> {
    let close = frame.require(col::CLOSE)?;
    let rsi = frame.require(col::RSI)?;
    let wt1 = frame.require(col::WT1)?;
    let wt2 = frame.require(col::WT2)?;
    let trend_strength = frame.require(col::TREND_STRENGTH)?;
    let ema_fast = frame.require(&params.indicators.ema_fast_key())?;
    let nw_upper = frame.require(col::NW_UPPER)?;
    let volume_ratio = frame.require(col::VOLUME_RATIO)?;
    let price_position = frame.require(col::PRICE_POSITION)?;

    let bearish = bearish_crossovers(
        wt1,
        wt2,
        params.wavetrend.overbought,
        params.wavetrend.oversold_lookback,
    );

    let mut column = ExitColumn::new(frame.len());
    for i in 0..frame.len() {
        if wt1[i].is_nan() || wt2[i].is_nan() {
            continue;
        }
        let inputs = ExitInputs {
            bearish_cross: bearish[i],
            close: close[i],
            rsi: rsi[i],
            trend_strength: trend_strength[i],
            ema_fast: ema_fast[i],
            nw_upper: nw_upper[i],
            volume_ratio: volume_ratio[i],
            price_position: price_position[i],
        };
        if let Some(tag) = exit_tag_at(&inputs, &params.exit) {
            column.set(i, tag);
        }
    }

    debug!(bars = frame.len(), exits = column.count(), "exit signals computed");
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> ExitInputs {
        ExitInputs {
            bearish_cross: false,
            close: 100.0,
            rsi: 50.0,
            trend_strength: 0.6,
            ema_fast: 100.0,
            nw_upper: 102.0,
            volume_ratio: 1.0,
            price_position: 0.5,
        }
    }

    #[test]
    fn calm_row_holds() {
        assert_eq!(exit_tag_at(&calm(), &ExitParams::default()), None);
    }

    #[test]
    fn each_clause_tags() {
        let p = ExitParams::default();
        let cases = [
            (ExitInputs { bearish_cross: true, ..calm() }, ExitTag::WtBearishCross),
            (ExitInputs { rsi: 80.0, ..calm() }, ExitTag::RsiOverbought),
            (ExitInputs { trend_strength: 0.2, ..calm() }, ExitTag::TrendDeterioration),
            (ExitInputs { close: 103.5, nw_upper: 110.0, ..calm() }, ExitTag::ProfitTarget),
            (ExitInputs { close: 102.0, rsi: 65.0, ..calm() }, ExitTag::NwResistance),
            (ExitInputs { volume_ratio: 4.5, ..calm() }, ExitTag::VolumeSpike),
            (ExitInputs { price_position: 0.97, rsi: 62.0, ..calm() }, ExitTag::PriceAtResistance),
        ];
        for (inputs, expected) in cases {
            assert_eq!(exit_tag_at(&inputs, &p), Some(expected));
        }
    }

    #[test]
    fn priority_order() {
        let p = ExitParams::default();
        // RSI overbought and volume spike at once: RSI wins
        let both = ExitInputs {
            rsi: 80.0,
            volume_ratio: 5.0,
            ..calm()
        };
        assert_eq!(exit_tag_at(&both, &p), Some(ExitTag::RsiOverbought));
        let cross_too = ExitInputs {
            bearish_cross: true,
            ..both
        };
        assert_eq!(exit_tag_at(&cross_too, &p), Some(ExitTag::WtBearishCross));
    }

    #[test]
    fn resistance_needs_elevated_rsi() {
        let p = ExitParams::default();
        let quiet = ExitInputs {
            close: 102.0,
            rsi: 55.0,
            ..calm()
        };
        assert_eq!(exit_tag_at(&quiet, &p), None);
    }

    #[test]
    fn undefined_row_never_exits() {
        let p = ExitParams::default();
        let row = ExitInputs {
            rsi: 90.0,
            nw_upper: f64::NAN,
            ..calm()
        };
        assert_eq!(exit_tag_at(&row, &p), None);
    }

    #[test]
    fn column_over_frame() {
        let mut frame = IndicatorFrame::new(3);
        let columns: [(&str, [f64; 3]); 9] = [
            (col::CLOSE, [100.0, 100.0, 100.0]),
            (col::RSI, [50.0, 80.0, 80.0]),
            (col::WT1, [10.0, 12.0, f64::NAN]),
            (col::WT2, [5.0, 8.0, 8.0]),
            (col::TREND_STRENGTH, [0.6, 0.6, 0.6]),
            ("ema_8", [100.0, 100.0, 100.0]),
            (col::NW_UPPER, [105.0, 105.0, 105.0]),
            (col::VOLUME_RATIO, [1.0, 1.0, 1.0]),
            (col::PRICE_POSITION, [0.5, 0.5, 0.5]),
        ];
        for (name, values) in columns {
            frame.insert(name, values.to_vec()).unwrap();
        }
        let column = compute_exit(&frame, &StrategyParameters::default()).unwrap();
        assert_eq!(column.flags(), &[false, true, false]);
        assert_eq!(column.tag(1), Some(ExitTag::RsiOverbought));
    }
}

//! Long entry fusion.
//!
//! An entry fires at bar i when all of the following hold:
//!
//! 1. armed: a bullish WaveTrend crossover and a Nadaraya-Watson support touch
//!    both occurred within the trailing `signal_memory` bars;
//! 2. `trend_strength > trend_strength_min`;
//! 3. fast EMA above mid EMA;
//! 4. volatility, volume and price-position filters pass;
//! 5. `rsi < rsi_entry_ceiling`;
//! 6. with `ml.enabled` and an injected model, `predict >= min_probability`.
//!
//! Support touch: `close <= nw_lower`, or `close < nw_estimate` with
//! `rsi < support_rsi_max`. Any undefined input at bar i blocks the entry.

use tracing::{debug, trace};

use super::crossover::bullish_crossovers;
use super::{fired_within, EntryColumn, EntryTag};
use crate::components::filter::{evaluate_all, quality_filters, FilterEvaluation, QualityFilter};
use crate::components::indicator::{col, FrameError, IndicatorFrame};
use crate::ml::{EvaluationContext, FeatureVector};
use crate::params::StrategyParameters;

/// Every term of the entry rule at one bar.
#[derive(Debug, Clone)]
pub struct EntryConditions {
    pub bar_index: usize,
    /// All inputs at this bar are defined.
    pub defined: bool,
    pub armed: bool,
    pub trend_ok: bool,
    pub ema_aligned: bool,
    pub rsi_ok: bool,
    pub filters: Vec<FilterEvaluation>,
    /// `Some` when the ML gate ran.
    pub ml_probability: Option<f64>,
    pub ml_ok: bool,
}

impl EntryConditions {
    pub fn filters_pass(&self) -> bool {
        self.filters.iter().all(|f| f.verdict.is_passed())
    }

    pub fn fires(&self) -> bool {
        self.defined
            && self.armed
            && self.trend_ok
            && self.ema_aligned
            && self.rsi_ok
            && self.filters_pass()
            && self.ml_ok
    }

    pub fn tag(&self) -> Option<EntryTag> {
        self.fires().then(|| {
            if self.ml_probability.is_some() {
                EntryTag::WaveKernelMlEntry
            } else {
                EntryTag::WaveKernelEntry
            }
        })
    }
}

/// Entry rule bound to one frame. Crossover and support events are found once
/// up front; `conditions` is then cheap per bar.
pub struct EntryEvaluator<'a> {
    frame: &'a IndicatorFrame,
    params: &'a StrategyParameters,
    ctx: &'a EvaluationContext,
    filters: Vec<Box<dyn QualityFilter>>,
    close: &'a [f64],
    rsi: &'a [f64],
    wt1: &'a [f64],
    wt2: &'a [f64],
    nw_estimate: &'a [f64],
    nw_lower: &'a [f64],
    trend_strength: &'a [f64],
    ema_fast: &'a [f64],
    ema_mid: &'a [f64],
    crossovers: Vec<bool>,
    support: Vec<bool>,
}

impl<'a> EntryEvaluator<'a> {
    pub fn new(
        frame: &'a IndicatorFrame,
        params: &'a StrategyParameters,
        ctx: &'a EvaluationContext,
    ) -> Result<Self, FrameError> {
        let close = frame.require(col::CLOSE)?;
        let rsi = frame.require(col::RSI)?;
        let wt1 = frame.require(col::WT1)?;
        let wt2 = frame.require(col::WT2)?;
        let nw_estimate = frame.require(col::NW_ESTIMATE)?;
        let nw_lower = frame.require(col::NW_LOWER)?;
        let trend_strength = frame.require(col::TREND_STRENGTH)?;
        let ema_fast = frame.require(&params.indicators.ema_fast_key())?;
        let ema_mid = frame.require(&params.indicators.ema_mid_key())?;

        let filters = quality_filters(&params.filters);
        for filter in &filters {
            for name in filter.required_columns() {
                frame.require(name)?;
            }
        }

        let crossovers = bullish_crossovers(
            wt1,
            wt2,
            params.wavetrend.oversold,
            params.wavetrend.oversold_lookback,
        );
        let support_rsi_max = params.entry.support_rsi_max;
        let support = (0..frame.len())
            .map(|i| {
                close[i] <= nw_lower[i] || (close[i] < nw_estimate[i] && rsi[i] < support_rsi_max)
            })
            .collect();

        Ok(Self {
            frame,
            params,
            ctx,
            filters,
            close,
            rsi,
            wt1,
            wt2,
            nw_estimate,
            nw_lower,
            trend_strength,
            ema_fast,
            ema_mid,
            crossovers,
            support,
        })
    }

    /// Bars with a bullish crossover.
    pub fn crossovers(&self) -> &[bool] {
        &self.crossovers
    }

    pub fn conditions(&self, i: usize) -> EntryConditions {
        let entry = &self.params.entry;
        let memory = entry.signal_memory;
        let defined = [
            self.close[i],
            self.rsi[i],
            self.wt1[i],
            self.wt2[i],
            self.nw_estimate[i],
            self.nw_lower[i],
            self.trend_strength[i],
            self.ema_fast[i],
            self.ema_mid[i],
        ]
        .iter()
        .all(|v| !v.is_nan());

        let armed = fired_within(&self.crossovers, i, memory) && fired_within(&self.support, i, memory);
        let filters = evaluate_all(&self.filters, self.frame, i);

        let mut conditions = EntryConditions {
            bar_index: i,
            defined,
            armed,
            trend_ok: self.trend_strength[i] > entry.trend_strength_min,
            ema_aligned: self.ema_fast[i] > self.ema_mid[i],
            rsi_ok: self.rsi[i] < entry.rsi_entry_ceiling,
            filters,
            ml_probability: None,
            ml_ok: true,
        };

        // The model only runs on bars that would otherwise fire.
        if self.params.ml.enabled && conditions.fires() && self.ctx.model().is_some() {
            let probability = FeatureVector::from_frame(self.frame, i, &self.params.indicators)
                .and_then(|features| self.ctx.predict(&features));
            trace!(bar = i, ?probability, "ml gate");
            conditions.ml_probability = Some(probability.unwrap_or(0.0));
            conditions.ml_ok = probability.is_some_and(|p| p >= self.params.ml.min_probability);
        }

        conditions
    }
}

/// Compute the entry column for every bar of `frame`.
pub fn compute_entry(
    frame: &IndicatorFrame,
    params: &StrategyParameters,
    ctx: &EvaluationContext,
) -> Result<EntryColumn, FrameError> {
    let evaluator = EntryEvaluator::new(frame, params, ctx)?;
    if params.ml.enabled && ctx.model().is_none() {
        debug!("ml gate enabled without an injected model, gate skipped");
    }

    let mut column = EntryColumn::new(frame.len());
    for i in 0..frame.len() {
        if let Some(tag) = evaluator.conditions(i).tag() {
            column.set(i, tag);
        }
    }

    debug!(
        bars = frame.len(),
        crossovers = evaluator.crossovers().iter().filter(|c| **c).count(),
        entries = column.count(),
        "entry signals computed"
    );
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::filter::FilterVerdict;
    use crate::ml::ProbabilityModel;
    use std::sync::Arc;

    struct Constant(f64);

    impl ProbabilityModel for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict(&self, _features: &FeatureVector) -> f64 {
            self.0
        }
    }

    /// Five-bar frame where bar 4 satisfies every term: crossover at 2,
    /// support touch at 3.
    fn armed_frame() -> IndicatorFrame {
        let mut frame = IndicatorFrame::new(5);
        let columns: Vec<(&str, [f64; 5])> = vec![
            (col::CLOSE, [100.0, 99.0, 98.0, 97.0, 99.0]),
            (col::RSI, [45.0, 40.0, 35.0, 30.0, 50.0]),
            (col::WT1, [-70.0, -65.0, -58.0, -50.0, -40.0]),
            (col::WT2, [-60.0, -60.0, -62.0, -58.0, -52.0]),
            (col::NW_ESTIMATE, [101.0, 100.0, 99.0, 98.0, 98.5]),
            (col::NW_LOWER, [98.0, 97.0, 96.0, 97.5, 96.0]),
            (col::TREND_STRENGTH, [0.4, 0.45, 0.5, 0.55, 0.6]),
            ("ema_8", [100.0, 100.0, 100.0, 100.0, 100.5]),
            ("ema_21", [100.2, 100.2, 100.1, 100.0, 100.0]),
            (col::ATR, [1.0; 5]),
            (col::MACD_HIST, [0.1; 5]),
            (col::VOLUME_RATIO, [1.0; 5]),
            (col::PRICE_POSITION, [0.5; 5]),
        ];
        for (name, values) in columns {
            frame.insert(name, values.to_vec()).unwrap();
        }
        frame
    }

    #[test]
    fn fires_when_armed_and_gated() {
        let frame = armed_frame();
        let params = StrategyParameters::default();
        let column = compute_entry(&frame, &params, &EvaluationContext::new()).unwrap();
        assert_eq!(column.fired_indices(), vec![4]);
        assert_eq!(column.tag(4), Some(EntryTag::WaveKernelEntry));
    }

    #[test]
    fn memory_window_expires() {
        let frame = armed_frame();
        let mut params = StrategyParameters::default();
        // crossover at 2 is outside a two-bar window ending at 4
        params.entry.signal_memory = 2;
        let column = compute_entry(&frame, &params, &EvaluationContext::new()).unwrap();
        assert_eq!(column.count(), 0);
    }

    /// Frame for the same-bar rule: bar 4 is a bullish crossover with wt1
    /// still below oversold, and the close sits on the lower band.
    fn same_bar_frame() -> IndicatorFrame {
        let mut frame = armed_frame();
        frame
            .insert(col::WT1, vec![-70.0, -68.0, -66.0, -64.0, -58.0])
            .unwrap();
        frame
            .insert(col::WT2, vec![-60.0, -62.0, -63.0, -62.0, -61.0])
            .unwrap();
        frame
            .insert(col::NW_LOWER, vec![98.0, 97.0, 96.0, 95.0, 99.5])
            .unwrap();
        frame
    }

    fn literal_params() -> StrategyParameters {
        let mut params = StrategyParameters::default();
        params.entry.signal_memory = 1;
        params.wavetrend.oversold_lookback = 1;
        params
    }

    #[test]
    fn literal_rule_fires_on_coinciding_bar() {
        let frame = same_bar_frame();
        let column = compute_entry(&frame, &literal_params(), &EvaluationContext::new()).unwrap();
        assert_eq!(column.fired_indices(), vec![4]);
    }

    #[test]
    fn literal_rule_needs_zone_on_crossover_bar() {
        let mut frame = same_bar_frame();
        // still a crossover at 4, but wt1 has already left the oversold zone
        frame
            .insert(col::WT1, vec![-70.0, -68.0, -66.0, -64.0, -50.0])
            .unwrap();
        let ctx = EvaluationContext::new();
        assert_eq!(compute_entry(&frame, &literal_params(), &ctx).unwrap().count(), 0);

        let mut params = literal_params();
        params.wavetrend.oversold_lookback = 5;
        assert_eq!(compute_entry(&frame, &params, &ctx).unwrap().fired_indices(), vec![4]);
    }

    #[test]
    fn literal_rule_needs_support_on_crossover_bar() {
        let mut frame = same_bar_frame();
        // support touch at 3 only: close 99 is above the estimate at 4
        frame
            .insert(col::NW_LOWER, vec![98.0, 97.0, 96.0, 97.5, 96.0])
            .unwrap();
        let ctx = EvaluationContext::new();
        assert_eq!(compute_entry(&frame, &literal_params(), &ctx).unwrap().count(), 0);

        let mut params = literal_params();
        params.entry.signal_memory = 2;
        assert_eq!(compute_entry(&frame, &params, &ctx).unwrap().fired_indices(), vec![4]);
    }

    #[test]
    fn failing_filter_blocks_entry() {
        let mut frame = armed_frame();
        frame.insert(col::ATR, vec![6.0; 5]).unwrap();
        let params = StrategyParameters::default();
        let ctx = EvaluationContext::new();
        let evaluator = EntryEvaluator::new(&frame, &params, &ctx).unwrap();
        let cond = evaluator.conditions(4);
        assert!(cond.armed && cond.trend_ok && cond.ema_aligned && cond.rsi_ok);
        assert_eq!(cond.filters[0].verdict, FilterVerdict::FilteredByVolatility);
        assert!(!cond.fires());
    }

    #[test]
    fn undefined_input_blocks_entry() {
        let mut frame = armed_frame();
        frame
            .insert(col::TREND_STRENGTH, vec![0.4, 0.45, 0.5, 0.55, f64::NAN])
            .unwrap();
        let params = StrategyParameters::default();
        let column = compute_entry(&frame, &params, &EvaluationContext::new()).unwrap();
        assert_eq!(column.count(), 0);
    }

    #[test]
    fn missing_column_is_an_error() {
        let mut frame = IndicatorFrame::new(5);
        frame.insert(col::CLOSE, vec![1.0; 5]).unwrap();
        let err = compute_entry(&frame, &StrategyParameters::default(), &EvaluationContext::new())
            .unwrap_err();
        assert_eq!(err, FrameError::MissingColumn("rsi".into()));
    }

    #[test]
    fn ml_gate_accepts_and_rejects() {
        let frame = armed_frame();
        let mut params = StrategyParameters::default();
        params.ml.enabled = true;
        params.ml.min_probability = 0.6;

        let confident = EvaluationContext::with_model(Arc::new(Constant(0.9)));
        let column = compute_entry(&frame, &params, &confident).unwrap();
        assert_eq!(column.tag(4), Some(EntryTag::WaveKernelMlEntry));

        let doubtful = EvaluationContext::with_model(Arc::new(Constant(0.3)));
        assert_eq!(compute_entry(&frame, &params, &doubtful).unwrap().count(), 0);

        let broken = EvaluationContext::with_model(Arc::new(Constant(f64::NAN)));
        assert_eq!(compute_entry(&frame, &params, &broken).unwrap().count(), 0);
    }

    #[test]
    fn ml_disabled_ignores_model() {
        let frame = armed_frame();
        let params = StrategyParameters::default();
        let ctx = EvaluationContext::with_model(Arc::new(Constant(0.0)));
        let column = compute_entry(&frame, &params, &ctx).unwrap();
        assert_eq!(column.tag(4), Some(EntryTag::WaveKernelEntry));
    }
}

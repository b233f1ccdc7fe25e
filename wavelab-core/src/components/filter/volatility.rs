//! Volatility filter - gates entries by ATR-relative volatility.
//!
//! Passes when `atr / close` is below the ceiling. The enhanced variant also
//! requires `std(close) / close` below its own ceiling.

use std::collections::BTreeMap;

use super::{defined, FilterEvaluation, FilterVerdict, QualityFilter};
use crate::components::indicator::{col, IndicatorFrame};
use crate::params::FilterParams;

#[derive(Debug, Clone)]
pub struct VolatilityFilter {
    pub ceiling: f64,
    /// `Some` enables the standard-deviation check.
    pub std_ceiling: Option<f64>,
}

impl VolatilityFilter {
    /// Panics if `ceiling` is not positive.
    pub fn new(ceiling: f64, std_ceiling: Option<f64>) -> Self {
        assert!(ceiling > 0.0, "volatility ceiling must be > 0");
        Self {
            ceiling,
            std_ceiling,
        }
    }

    pub fn from_params(params: &FilterParams) -> Self {
        Self::new(
            params.volatility_ceiling,
            params.use_std.then_some(params.std_ceiling),
        )
    }
}

impl QualityFilter for VolatilityFilter {
    fn name(&self) -> &str {
        "volatility_filter"
    }

    fn required_columns(&self) -> Vec<&'static str> {
        let mut cols = vec![col::CLOSE, col::ATR];
        if self.std_ceiling.is_some() {
            cols.push(col::STD_CLOSE);
        }
        cols
    }

    fn evaluate(&self, frame: &IndicatorFrame, bar_index: usize) -> FilterEvaluation {
        let close = defined(frame, col::CLOSE, bar_index).filter(|c| *c > 0.0);
        let atr = defined(frame, col::ATR, bar_index);

        let (Some(close), Some(atr)) = (close, atr) else {
            return FilterEvaluation::undefined(self.name(), bar_index);
        };

        let atr_ratio = atr / close;
        let mut state = BTreeMap::new();
        state.insert("atr".into(), atr);
        state.insert("close".into(), close);
        state.insert("atr_ratio".into(), atr_ratio);

        let mut verdict = if atr_ratio < self.ceiling {
            FilterVerdict::Passed
        } else {
            FilterVerdict::FilteredByVolatility
        };

        if let Some(std_ceiling) = self.std_ceiling {
            match defined(frame, col::STD_CLOSE, bar_index) {
                Some(std) => {
                    let std_ratio = std / close;
                    state.insert("std_ratio".into(), std_ratio);
                    if std_ratio >= std_ceiling {
                        verdict = FilterVerdict::FilteredByVolatility;
                    }
                }
                None => return FilterEvaluation::undefined(self.name(), bar_index),
            }
        }

        FilterEvaluation {
            filter_name: self.name().to_string(),
            bar_index,
            verdict,
            filter_state: state,
        }
    }
}

//! Price-position filter.
//!
//! `pp = (close - min(low, N)) / (max(high, N) - min(low, N))`; 0.5 when the
//! range is flat. Entries pass only while pp is below the ceiling, i.e. the
//! price has not already run to the top of its recent range.

use std::collections::BTreeMap;

use super::{defined, FilterEvaluation, FilterVerdict, QualityFilter};
use crate::components::indicator::{col, IndicatorFrame};
use crate::params::FilterParams;

pub fn price_position_of_series(close: &[f64], rolling_low: &[f64], rolling_high: &[f64]) -> Vec<f64> {
    close
        .iter()
        .zip(rolling_low)
        .zip(rolling_high)
        .map(|((c, lo), hi)| {
            if c.is_nan() || lo.is_nan() || hi.is_nan() {
                f64::NAN
            } else if hi > lo {
                (c - lo) / (hi - lo)
            } else {
                0.5
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PricePositionFilter {
    pub ceiling: f64,
}

impl PricePositionFilter {
    /// Panics if `ceiling` is not positive.
    pub fn new(ceiling: f64) -> Self {
        assert!(ceiling > 0.0, "price position ceiling must be > 0");
        Self { ceiling }
    }

    pub fn from_params(params: &FilterParams) -> Self {
        Self::new(params.price_position_ceiling)
    }
}

impl QualityFilter for PricePositionFilter {
    fn name(&self) -> &str {
        "price_position_filter"
    }

    fn required_columns(&self) -> Vec<&'static str> {
        vec![col::PRICE_POSITION]
    }

    fn evaluate(&self, frame: &IndicatorFrame, bar_index: usize) -> FilterEvaluation {
        let Some(pp) = defined(frame, col::PRICE_POSITION, bar_index) else {
            return FilterEvaluation::undefined(self.name(), bar_index);
        };
        let mut state = BTreeMap::new();
        state.insert("price_position".into(), pp);
        let verdict = if pp < self.ceiling {
            FilterVerdict::Passed
        } else {
            FilterVerdict::FilteredByPricePosition
        };
        FilterEvaluation {
            filter_name: self.name().to_string(),
            bar_index,
            verdict,
            filter_state: state,
        }
    }
}

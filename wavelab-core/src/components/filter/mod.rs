//! Quality filters: gate entries on market conditions.
//!
//! Each filter reads one bar of an `IndicatorFrame` and produces a
//! `FilterEvaluation` capturing the verdict and the values it looked at.
//! An undefined input never passes.

pub mod price_position;
pub mod volatility;
pub mod volume;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::indicator::IndicatorFrame;
use crate::params::FilterParams;

/// Outcome of a single filter at a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterVerdict {
    Passed,
    FilteredByVolatility,
    FilteredByVolume,
    FilteredByPricePosition,
    /// An input was missing or NaN.
    Undefined,
}

impl FilterVerdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, FilterVerdict::Passed)
    }
}

/// Verdict plus the filter's state snapshot at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterEvaluation {
    pub filter_name: String,
    pub bar_index: usize,
    pub verdict: FilterVerdict,
    pub filter_state: BTreeMap<String, f64>,
}

impl FilterEvaluation {
    fn undefined(filter_name: &str, bar_index: usize) -> Self {
        Self {
            filter_name: filter_name.to_string(),
            bar_index,
            verdict: FilterVerdict::Undefined,
            filter_state: BTreeMap::new(),
        }
    }
}

/// Trait for quality filters.
///
/// Filters are stateless: the same frame and bar always produce the same
/// evaluation.
pub trait QualityFilter: Send + Sync {
    fn name(&self) -> &str;

    /// Columns this filter reads. The pipeline writes them before any filter runs.
    fn required_columns(&self) -> Vec<&'static str>;

    fn evaluate(&self, frame: &IndicatorFrame, bar_index: usize) -> FilterEvaluation;
}

/// The filter set implied by a parameter block: volatility, volume, price position.
pub fn quality_filters(params: &FilterParams) -> Vec<Box<dyn QualityFilter>> {
    vec![
        Box::new(VolatilityFilter::from_params(params)),
        Box::new(VolumeFilter::from_params(params)),
        Box::new(PricePositionFilter::from_params(params)),
    ]
}

/// Evaluate every filter at `bar_index`.
pub fn evaluate_all(
    filters: &[Box<dyn QualityFilter>],
    frame: &IndicatorFrame,
    bar_index: usize,
) -> Vec<FilterEvaluation> {
    filters
        .iter()
        .map(|f| f.evaluate(frame, bar_index))
        .collect()
}

/// Read a defined value, or `None` if the column is missing or the value is NaN.
fn defined(frame: &IndicatorFrame, name: &str, bar_index: usize) -> Option<f64> {
    frame.get(name, bar_index).filter(|v| !v.is_nan())
}

pub use price_position::{price_position_of_series, PricePositionFilter};
pub use volatility::VolatilityFilter;
pub use volume::{volume_ratio_of_series, VolumeFilter};

//! Volume filter: `volume / SMA(volume)` must sit inside `[floor, ceiling]`.

use std::collections::BTreeMap;

use super::{defined, FilterEvaluation, FilterVerdict, QualityFilter};
use crate::components::indicator::{col, IndicatorFrame};
use crate::params::FilterParams;

/// Ratio of each bar's volume to its trailing average. Undefined where the
/// average is undefined or zero.
pub fn volume_ratio_of_series(volume: &[f64], volume_sma: &[f64]) -> Vec<f64> {
    volume
        .iter()
        .zip(volume_sma)
        .map(|(v, avg)| {
            if avg.is_nan() || *avg == 0.0 {
                f64::NAN
            } else {
                v / avg
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct VolumeFilter {
    pub floor: f64,
    pub ceiling: f64,
}

impl VolumeFilter {
    /// Panics if `floor` is negative or `ceiling < floor`.
    pub fn new(floor: f64, ceiling: f64) -> Self {
        assert!(floor >= 0.0, "floor must be >= 0");
        assert!(ceiling >= floor, "ceiling must be >= floor");
        Self { floor, ceiling }
    }

    pub fn from_params(params: &FilterParams) -> Self {
        Self::new(params.volume_floor, params.volume_ceiling)
    }
}

impl QualityFilter for VolumeFilter {
    fn name(&self) -> &str {
        "volume_filter"
    }

    fn required_columns(&self) -> Vec<&'static str> {
        vec![col::VOLUME_RATIO]
    }

    fn evaluate(&self, frame: &IndicatorFrame, bar_index: usize) -> FilterEvaluation {
        let Some(ratio) = defined(frame, col::VOLUME_RATIO, bar_index) else {
            return FilterEvaluation::undefined(self.name(), bar_index);
        };
        let mut state = BTreeMap::new();
        state.insert("volume_ratio".into(), ratio);
        let verdict = if ratio >= self.floor && ratio <= self.ceiling {
            FilterVerdict::Passed
        } else {
            FilterVerdict::FilteredByVolume
        };
        FilterEvaluation {
            filter_name: self.name().to_string(),
            bar_index,
            verdict,
            filter_state: state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio_frame(ratio: f64) -> IndicatorFrame {
        let mut frame = IndicatorFrame::new(1);
        frame.insert(col::VOLUME_RATIO, vec![ratio]).unwrap();
        frame
    }

    #[test]
    fn ratio_of_constant_volume_is_one() {
        let ratio = volume_ratio_of_series(&[500.0; 3], &[500.0; 3]);
        assert_eq!(ratio, vec![1.0; 3]);
    }

    #[test]
    fn zero_average_is_undefined() {
        let ratio = volume_ratio_of_series(&[0.0, 10.0], &[0.0, f64::NAN]);
        assert!(ratio[0].is_nan());
        assert!(ratio[1].is_nan());
    }

    #[test]
    fn inclusive_bounds() {
        let filter = VolumeFilter::new(0.5, 3.0);
        assert!(filter.evaluate(&ratio_frame(0.5), 0).verdict.is_passed());
        assert!(filter.evaluate(&ratio_frame(3.0), 0).verdict.is_passed());
        assert_eq!(
            filter.evaluate(&ratio_frame(0.49), 0).verdict,
            FilterVerdict::FilteredByVolume
        );
        assert_eq!(
            filter.evaluate(&ratio_frame(3.5), 0).verdict,
            FilterVerdict::FilteredByVolume
        );
    }

    #[test]
    fn undefined_ratio() {
        let filter = VolumeFilter::new(0.5, 3.0);
        assert_eq!(
            filter.evaluate(&ratio_frame(f64::NAN), 0).verdict,
            FilterVerdict::Undefined
        );
    }
}

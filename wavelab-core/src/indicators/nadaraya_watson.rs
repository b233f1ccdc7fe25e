//! Nadaraya-Watson kernel regression with volatility bands.
//!
//! Gaussian weights `w(j) = exp(-j² / (2·bandwidth²))` over offsets
//! `j ∈ [-lookback, +lookback]` (centered) or `j ∈ [-lookback, 0]` (causal).
//!
//! Boundary policy: truncate and renormalize. Near the series edges only the
//! in-range neighbors contribute, and their weights are rescaled to sum to 1.
//! Undefined neighbors are skipped the same way.
//!
//! The centered estimate repaints: the last `lookback` values change as new
//! bars arrive. The causal estimate never does.
//!
//! Bands: `estimate ± std_multiplier · rolling_std(close, lookback)`.

use serde::{Deserialize, Serialize};

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::rolling::rolling_std;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelMode {
    /// Symmetric window ("same" convolution). Repaints the trailing `lookback` bars.
    #[default]
    Centered,
    /// Trailing half-window only. Never reads future bars.
    Causal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NwBand {
    Estimate,
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct NwBands {
    pub estimate: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

fn kernel_weights(bandwidth: f64, lookback: usize) -> Vec<f64> {
    (0..=lookback)
        .map(|j| {
            let j = j as f64;
            (-(j * j) / (2.0 * bandwidth * bandwidth)).exp()
        })
        .collect()
}

/// Kernel estimate only.
pub fn kernel_estimate(values: &[f64], bandwidth: f64, lookback: usize, mode: KernelMode) -> Vec<f64> {
    let n = values.len();
    let weights = kernel_weights(bandwidth, lookback);
    let mut result = vec![f64::NAN; n];

    for (i, out) in result.iter_mut().enumerate() {
        let lo = i.saturating_sub(lookback);
        let hi = match mode {
            KernelMode::Centered => (i + lookback).min(n.saturating_sub(1)),
            KernelMode::Causal => i,
        };

        let mut acc = 0.0;
        let mut total = 0.0;
        for (t, &v) in values.iter().enumerate().take(hi + 1).skip(lo) {
            if v.is_nan() {
                continue;
            }
            let w = weights[t.abs_diff(i)];
            acc += w * v;
            total += w;
        }
        if total > 0.0 {
            *out = acc / total;
        }
    }

    result
}

pub fn nadaraya_watson(
    values: &[f64],
    bandwidth: f64,
    lookback: usize,
    std_multiplier: f64,
    mode: KernelMode,
) -> NwBands {
    let estimate = kernel_estimate(values, bandwidth, lookback, mode);
    let std = rolling_std(values, lookback);
    let upper = estimate
        .iter()
        .zip(&std)
        .map(|(e, s)| e + std_multiplier * s)
        .collect();
    let lower = estimate
        .iter()
        .zip(&std)
        .map(|(e, s)| e - std_multiplier * s)
        .collect();
    NwBands {
        estimate,
        upper,
        lower,
    }
}

#[derive(Debug, Clone)]
pub struct NadarayaWatson {
    bandwidth: f64,
    lookback: usize,
    std_multiplier: f64,
    mode: KernelMode,
    band: NwBand,
    name: String,
}

impl NadarayaWatson {
    pub fn new(
        bandwidth: f64,
        lookback: usize,
        std_multiplier: f64,
        mode: KernelMode,
        band: NwBand,
    ) -> Self {
        assert!(bandwidth > 0.0, "bandwidth must be > 0");
        assert!(lookback >= 1, "lookback must be >= 1");
        let label = match band {
            NwBand::Estimate => "nw_estimate",
            NwBand::Upper => "nw_upper",
            NwBand::Lower => "nw_lower",
        };
        Self {
            bandwidth,
            lookback,
            std_multiplier,
            mode,
            band,
            name: format!("{label}_{bandwidth}_{lookback}"),
        }
    }
}

impl Indicator for NadarayaWatson {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.band {
            NwBand::Estimate => 0,
            NwBand::Upper | NwBand::Lower => self.lookback - 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let bands = nadaraya_watson(
            &closes,
            self.bandwidth,
            self.lookback,
            self.std_multiplier,
            self.mode,
        );
        match self.band {
            NwBand::Estimate => bands.estimate,
            NwBand::Upper => bands.upper,
            NwBand::Lower => bands.lower,
        }
    }
}

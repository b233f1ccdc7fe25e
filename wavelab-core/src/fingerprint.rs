//! Run fingerprinting: deterministic identification of an evaluation.
//!
//! - `ParamsFingerprint`: blake3 of the canonical JSON of a `StrategyParameters`.
//! - `RunFingerprint`: parameters hash + input series hash, recorded next to
//!   every signals file so two outputs can be compared without re-running.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{PriceSeries, Timeframe};
use crate::params::{ParamError, StrategyParameters, StrategyVariant};

/// Hex-encoded blake3 hash of a parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamsFingerprint(pub String);

impl ParamsFingerprint {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ParamsFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Complete identity of one evaluation: what ran, on what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub variant: StrategyVariant,
    pub pair: String,
    pub timeframe: Timeframe,
    pub bars: usize,
    pub params_hash: ParamsFingerprint,
    pub series_hash: String,
}

impl RunFingerprint {
    pub fn new(series: &PriceSeries, params: &StrategyParameters) -> Result<Self, ParamError> {
        Ok(Self {
            variant: params.variant,
            pair: series.pair().to_string(),
            timeframe: series.timeframe(),
            bars: series.len(),
            params_hash: params.fingerprint()?,
            series_hash: series.fingerprint(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::new("BTC/USDT", Timeframe::M1, make_bars(closes)).unwrap()
    }

    #[test]
    fn same_inputs_same_fingerprint() {
        let params = StrategyVariant::WaveKernel.parameters();
        let a = RunFingerprint::new(&series(&[100.0, 101.0, 102.0]), &params).unwrap();
        let b = RunFingerprint::new(&series(&[100.0, 101.0, 102.0]), &params).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.bars, 3);
        assert_eq!(a.params_hash.0.len(), 64);
        assert_eq!(a.params_hash.short().len(), 12);
    }

    #[test]
    fn series_change_changes_series_hash_only() {
        let params = StrategyVariant::WaveKernel.parameters();
        let a = RunFingerprint::new(&series(&[100.0, 101.0, 102.0]), &params).unwrap();
        let b = RunFingerprint::new(&series(&[100.0, 101.0, 102.5]), &params).unwrap();
        assert_eq!(a.params_hash, b.params_hash);
        assert_ne!(a.series_hash, b.series_hash);
    }

    #[test]
    fn variants_have_distinct_hashes() {
        let hashes: Vec<_> = StrategyVariant::ALL
            .iter()
            .map(|v| v.parameters().fingerprint().unwrap())
            .collect();
        for i in 0..hashes.len() {
            for j in (i + 1)..hashes.len() {
                assert_ne!(hashes[i], hashes[j]);
            }
        }
    }

    #[test]
    fn serialization_roundtrip() {
        let params = StrategyVariant::MlFeature.parameters();
        let fp = RunFingerprint::new(&series(&[10.0, 11.0]), &params).unwrap();
        let json = serde_json::to_string(&fp).unwrap();
        let back: RunFingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(fp, back);
    }
}

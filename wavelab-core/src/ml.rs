//! ML confirmation gate.
//!
//! The pipeline never trains or owns a model. A host injects any
//! `ProbabilityModel` through an `EvaluationContext`; entry fusion calls
//! `predict` on a fixed feature vector extracted from the indicator frame.
//!
//! `LogisticModel` is a minimal model loadable from JSON weights so the CLI
//! can exercise the gate without an external runtime.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::components::indicator::{col, IndicatorFrame};
use crate::params::IndicatorParams;

/// Feature order of every `FeatureVector`.
pub const FEATURE_NAMES: [&str; 10] = [
    "rsi",
    "macd_hist",
    "wt1",
    "wt2",
    "trend_strength",
    "volume_ratio",
    "price_position",
    "atr_ratio",
    "nw_gap",
    "ema_spread",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("failed to parse model: {0}")]
    Parse(String),

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("model has {weights} weights for {features} feature names")]
    DimensionMismatch { weights: usize, features: usize },

    #[error("unknown feature '{0}'")]
    UnknownFeature(String),
}

/// Fixed-order features of one bar. Only built when every input is defined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_NAMES.len()],
}

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_NAMES.len()]) -> Self {
        Self { values }
    }

    /// Extract the features of bar `i`. `None` if any input is undefined.
    pub fn from_frame(frame: &IndicatorFrame, i: usize, indicators: &IndicatorParams) -> Option<Self> {
        let get = |name: &str| frame.get(name, i).filter(|v| !v.is_nan());
        let close = get(col::CLOSE).filter(|c| *c > 0.0)?;
        let values = [
            get(col::RSI)? / 100.0,
            get(col::MACD_HIST)? / close,
            get(col::WT1)? / 100.0,
            get(col::WT2)? / 100.0,
            get(col::TREND_STRENGTH)?,
            get(col::VOLUME_RATIO)?,
            get(col::PRICE_POSITION)?,
            get(col::ATR)? / close,
            (close - get(col::NW_ESTIMATE)?) / close,
            (get(&indicators.ema_fast_key())? - get(&indicators.ema_mid_key())?) / close,
        ];
        Some(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.values[idx])
    }
}

/// Anything that maps features to a probability of a favorable move.
pub trait ProbabilityModel: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, features: &FeatureVector) -> f64;
}

/// Clamp a model output into [0, 1]; non-finite outputs count as 0.
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogisticWeights {
    feature_names: Vec<String>,
    weights: Vec<f64>,
    bias: f64,
}

/// `sigmoid(bias + Σ wₖ·xₖ)` over a named subset of `FEATURE_NAMES`.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    weights: Vec<f64>,
    indices: Vec<usize>,
    bias: f64,
}

impl LogisticModel {
    pub fn new(feature_names: &[String], weights: Vec<f64>, bias: f64) -> Result<Self, ModelError> {
        if feature_names.len() != weights.len() {
            return Err(ModelError::DimensionMismatch {
                weights: weights.len(),
                features: feature_names.len(),
            });
        }
        let indices = feature_names
            .iter()
            .map(|name| {
                FEATURE_NAMES
                    .iter()
                    .position(|n| *n == name.as_str())
                    .ok_or_else(|| ModelError::UnknownFeature(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            weights,
            indices,
            bias,
        })
    }

    /// Parse `{"feature_names": [...], "weights": [...], "bias": f}`.
    pub fn from_json(s: &str) -> Result<Self, ModelError> {
        let file: LogisticWeights =
            serde_json::from_str(s).map_err(|e| ModelError::Parse(e.to_string()))?;
        Self::new(&file.feature_names, file.weights, file.bias)
    }

    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}

impl ProbabilityModel for LogisticModel {
    fn name(&self) -> &str {
        "logistic"
    }

    fn predict(&self, features: &FeatureVector) -> f64 {
        let z = self
            .indices
            .iter()
            .zip(&self.weights)
            .fold(self.bias, |acc, (&idx, w)| acc + w * features.values[idx]);
        1.0 / (1.0 + (-z).exp())
    }
}

/// Per-evaluation dependencies. Holds the injected model, if any.
#[derive(Clone, Default)]
pub struct EvaluationContext {
    model: Option<Arc<dyn ProbabilityModel>>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: Arc<dyn ProbabilityModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn model(&self) -> Option<&dyn ProbabilityModel> {
        self.model.as_deref()
    }

    /// Clamped prediction, or `None` without a model.
    pub fn predict(&self, features: &FeatureVector) -> Option<f64> {
        self.model
            .as_ref()
            .map(|m| clamp_probability(m.predict(features)))
    }
}

impl std::fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("model", &self.model.as_ref().map(|m| m.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f64);

    impl ProbabilityModel for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict(&self, _features: &FeatureVector) -> f64 {
            self.0
        }
    }

    fn full_frame() -> IndicatorFrame {
        let mut frame = IndicatorFrame::new(2);
        let cols: [(&str, [f64; 2]); 12] = [
            (col::CLOSE, [100.0, 100.0]),
            (col::RSI, [40.0, 40.0]),
            (col::MACD_HIST, [0.5, 0.5]),
            (col::WT1, [-20.0, -20.0]),
            (col::WT2, [-30.0, -30.0]),
            (col::TREND_STRENGTH, [0.6, 0.6]),
            (col::VOLUME_RATIO, [1.1, 1.1]),
            (col::PRICE_POSITION, [0.4, f64::NAN]),
            (col::ATR, [2.0, 2.0]),
            (col::NW_ESTIMATE, [101.0, 101.0]),
            ("ema_8", [100.5, 100.5]),
            ("ema_21", [100.0, 100.0]),
        ];
        for (name, values) in cols {
            frame.insert(name, values.to_vec()).unwrap();
        }
        frame
    }

    #[test]
    fn features_from_frame() {
        let frame = full_frame();
        let fv = FeatureVector::from_frame(&frame, 0, &IndicatorParams::default()).unwrap();
        assert_eq!(fv.values().len(), FEATURE_NAMES.len());
        assert_eq!(fv.get("rsi"), Some(0.4));
        assert_eq!(fv.get("atr_ratio"), Some(0.02));
        assert_eq!(fv.get("nw_gap"), Some(-0.01));
        assert_eq!(fv.get("missing"), None);
    }

    #[test]
    fn undefined_feature_yields_none() {
        let frame = full_frame();
        assert!(FeatureVector::from_frame(&frame, 1, &IndicatorParams::default()).is_none());
    }

    #[test]
    fn clamping() {
        assert_eq!(clamp_probability(1.7), 1.0);
        assert_eq!(clamp_probability(-0.2), 0.0);
        assert_eq!(clamp_probability(f64::NAN), 0.0);
        assert_eq!(clamp_probability(f64::INFINITY), 0.0);
        assert_eq!(clamp_probability(0.3), 0.3);
    }

    #[test]
    fn context_clamps_injected_model() {
        let fv = FeatureVector::new([0.0; FEATURE_NAMES.len()]);
        assert_eq!(EvaluationContext::new().predict(&fv), None);
        let ctx = EvaluationContext::with_model(Arc::new(Constant(3.0)));
        assert_eq!(ctx.predict(&fv), Some(1.0));
        assert_eq!(ctx.model().map(|m| m.name()), Some("constant"));
    }

    #[test]
    fn logistic_from_json() {
        let model = LogisticModel::from_json(
            r#"{"feature_names": ["rsi", "trend_strength"], "weights": [-2.0, 4.0], "bias": -1.0}"#,
        )
        .unwrap();
        let mut values = [0.0; FEATURE_NAMES.len()];
        values[0] = 0.5;
        values[4] = 0.5;
        // z = -1 - 1 + 2 = 0
        let p = model.predict(&FeatureVector::new(values));
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn logistic_rejects_bad_shapes() {
        let err = LogisticModel::from_json(r#"{"feature_names": ["rsi"], "weights": [], "bias": 0.0}"#)
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::DimensionMismatch {
                weights: 0,
                features: 1
            }
        );
        let err = LogisticModel::from_json(
            r#"{"feature_names": ["sentiment"], "weights": [1.0], "bias": 0.0}"#,
        )
        .unwrap_err();
        assert_eq!(err, ModelError::UnknownFeature("sentiment".into()));
        assert!(matches!(
            LogisticModel::from_json("not json"),
            Err(ModelError::Parse(_))
        ));
    }
}

//! Strategy parameters: one shape shared by every strategy variant.
//!
//! Parameters are loaded from TOML (every section optional, missing fields
//! take their defaults), validated once at load time, and then treated as
//! immutable. Per-bar evaluation never re-checks ranges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::components::indicator::col;
use crate::domain::Timeframe;
use crate::fingerprint::ParamsFingerprint;
use crate::indicators::KernelMode;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("inconsistent parameters: {0}")]
    Inconsistent(String),

    #[error("failed to parse parameters: {0}")]
    Parse(String),

    #[error("failed to serialize parameters: {0}")]
    Serialize(String),

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("unknown strategy variant '{0}' (valid: wave_kernel, enhanced_wave, multi_timeframe, ml_feature)")]
    UnknownVariant(String),
}

// ─── Sections ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub ema_fast: usize,
    pub ema_mid: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_std: f64,
    pub atr_period: usize,
    pub std_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_fast: 8,
            ema_mid: 21,
            ema_slow: 50,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bb_period: 20,
            bb_std: 2.0,
            atr_period: 14,
            std_period: 20,
        }
    }
}

impl IndicatorParams {
    pub fn ema_fast_key(&self) -> String {
        col::ema(self.ema_fast)
    }

    pub fn ema_mid_key(&self) -> String {
        col::ema(self.ema_mid)
    }

    pub fn ema_slow_key(&self) -> String {
        col::ema(self.ema_slow)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTrendParams {
    pub channel_len: usize,
    pub average_len: usize,
    pub overbought: f64,
    pub oversold: f64,
    /// Bars (ending at the crossover bar) in which wt1 must have visited the
    /// oversold/overbought zone. 1 = same bar.
    pub oversold_lookback: usize,
}

impl Default for WaveTrendParams {
    fn default() -> Self {
        Self {
            channel_len: 8,
            average_len: 14,
            overbought: 55.0,
            oversold: -55.0,
            oversold_lookback: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelParams {
    pub bandwidth: f64,
    pub lookback: usize,
    pub std_multiplier: f64,
    pub mode: KernelMode,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            bandwidth: 3.5,
            lookback: 25,
            std_multiplier: 1.2,
            mode: KernelMode::Centered,
        }
    }
}

/// Weights of the trend-strength composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendWeights {
    pub fast_above_mid: f64,
    pub mid_above_slow: f64,
    pub close_above_fast: f64,
    pub ema: f64,
    pub rsi: f64,
    pub wavetrend: f64,
}

impl Default for TrendWeights {
    fn default() -> Self {
        Self {
            fast_above_mid: 0.4,
            mid_above_slow: 0.3,
            close_above_fast: 0.3,
            ema: 0.5,
            rsi: 0.3,
            wavetrend: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub volatility_ceiling: f64,
    /// Also gate on `std(close)/close` (enhanced variant).
    pub use_std: bool,
    pub std_ceiling: f64,
    pub volume_window: usize,
    pub volume_floor: f64,
    pub volume_ceiling: f64,
    pub position_window: usize,
    pub price_position_ceiling: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            volatility_ceiling: 0.05,
            use_std: false,
            std_ceiling: 0.03,
            volume_window: 20,
            volume_floor: 0.5,
            volume_ceiling: 3.0,
            position_window: 20,
            price_position_ceiling: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryParams {
    /// Trailing bars in which the crossover and the support touch must both occur.
    pub signal_memory: usize,
    pub support_rsi_max: f64,
    pub trend_strength_min: f64,
    pub rsi_entry_ceiling: f64,
}

impl Default for EntryParams {
    fn default() -> Self {
        Self {
            signal_memory: 10,
            support_rsi_max: 40.0,
            trend_strength_min: 0.5,
            rsi_entry_ceiling: 65.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitParams {
    pub rsi_exit_ceiling: f64,
    pub trend_floor: f64,
    pub profit_margin: f64,
    pub mid_rsi: f64,
    pub volume_spike: f64,
    pub resistance_ceiling: f64,
}

impl Default for ExitParams {
    fn default() -> Self {
        Self {
            rsi_exit_ceiling: 75.0,
            trend_floor: 0.3,
            profit_margin: 0.03,
            mid_rsi: 60.0,
            volume_spike: 4.0,
            resistance_ceiling: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopParams {
    pub atr_multiplier: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for StopParams {
    fn default() -> Self {
        Self {
            atr_multiplier: 2.5,
            floor: 0.04,
            ceiling: 0.12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MtfParams {
    pub entry: Timeframe,
    pub momentum: Timeframe,
    pub medium: Timeframe,
    pub long: Timeframe,
    pub long_trend_min: f64,
    pub medium_trend_min: f64,
    pub momentum_rsi_min: f64,
    pub precise_rsi_max: f64,
}

impl Default for MtfParams {
    fn default() -> Self {
        Self {
            entry: Timeframe::M1,
            momentum: Timeframe::M5,
            medium: Timeframe::M15,
            long: Timeframe::H1,
            long_trend_min: 0.5,
            medium_trend_min: 0.5,
            momentum_rsi_min: 50.0,
            precise_rsi_max: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlParams {
    pub enabled: bool,
    pub min_probability: f64,
}

impl Default for MlParams {
    fn default() -> Self {
        Self {
            enabled: false,
            min_probability: 0.55,
        }
    }
}

// ─── StrategyVariant ─────────────────────────────────────────────────

/// Named strategy variants. Each is a parameter preset over the same pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyVariant {
    #[default]
    WaveKernel,
    EnhancedWave,
    MultiTimeframe,
    MlFeature,
}

impl StrategyVariant {
    pub const ALL: [StrategyVariant; 4] = [
        StrategyVariant::WaveKernel,
        StrategyVariant::EnhancedWave,
        StrategyVariant::MultiTimeframe,
        StrategyVariant::MlFeature,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::WaveKernel => "wave_kernel",
            Self::EnhancedWave => "enhanced_wave",
            Self::MultiTimeframe => "multi_timeframe",
            Self::MlFeature => "ml_feature",
        }
    }

    /// Convert to a full parameter set.
    pub fn parameters(self) -> StrategyParameters {
        let mut p = StrategyParameters {
            variant: self,
            ..StrategyParameters::default()
        };
        match self {
            Self::WaveKernel => {}
            Self::EnhancedWave => {
                p.wavetrend.channel_len = 6;
                p.wavetrend.average_len = 18;
                p.filters.use_std = true;
                p.filters.volume_ceiling = 4.0;
                p.filters.price_position_ceiling = 0.85;
                p.entry.trend_strength_min = 0.55;
                p.exit.volume_spike = 5.0;
            }
            Self::MultiTimeframe => {
                p.kernel.mode = KernelMode::Causal;
                p.exit.trend_floor = 0.35;
            }
            Self::MlFeature => {
                p.ml.enabled = true;
                p.ml.min_probability = 0.6;
            }
        }
        p
    }
}

impl fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyVariant {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| ParamError::UnknownVariant(s.to_string()))
    }
}

// ─── StrategyParameters ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParameters {
    pub variant: StrategyVariant,
    pub indicators: IndicatorParams,
    pub wavetrend: WaveTrendParams,
    pub kernel: KernelParams,
    pub trend_weights: TrendWeights,
    pub filters: FilterParams,
    pub entry: EntryParams,
    pub exit: ExitParams,
    pub stop: StopParams,
    pub mtf: MtfParams,
    pub ml: MlParams,
}

const MAX_WINDOW: usize = 500;

fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ParamError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ParamError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn check_window(field: &'static str, value: usize) -> Result<(), ParamError> {
    check(field, value as f64, 1.0, MAX_WINDOW as f64)
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ParamError> {
    check(field, value, 0.0, 1.0)
}

fn check_rsi(field: &'static str, value: f64) -> Result<(), ParamError> {
    check(field, value, 0.0, 100.0)
}

impl StrategyParameters {
    /// Parse from TOML and validate.
    pub fn from_toml(s: &str) -> Result<Self, ParamError> {
        let params: Self = toml::from_str(s).map_err(|e| ParamError::Parse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_file(path: &Path) -> Result<Self, ParamError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ParamError> {
        toml::to_string_pretty(self).map_err(|e| ParamError::Serialize(e.to_string()))
    }

    /// Deterministic hash of every parameter value.
    pub fn fingerprint(&self) -> Result<ParamsFingerprint, ParamError> {
        let json = serde_json::to_string(self).map_err(|e| ParamError::Serialize(e.to_string()))?;
        Ok(ParamsFingerprint::from_bytes(json.as_bytes()))
    }

    /// Check every range and cross-field rule.
    pub fn validate(&self) -> Result<(), ParamError> {
        let ind = &self.indicators;
        check_window("indicators.ema_fast", ind.ema_fast)?;
        check_window("indicators.ema_mid", ind.ema_mid)?;
        check_window("indicators.ema_slow", ind.ema_slow)?;
        check_window("indicators.rsi_period", ind.rsi_period)?;
        check_window("indicators.macd_fast", ind.macd_fast)?;
        check_window("indicators.macd_slow", ind.macd_slow)?;
        check_window("indicators.macd_signal", ind.macd_signal)?;
        check_window("indicators.bb_period", ind.bb_period)?;
        check("indicators.bb_std", ind.bb_std, 0.0, 10.0)?;
        check_window("indicators.atr_period", ind.atr_period)?;
        check_window("indicators.std_period", ind.std_period)?;
        if !(ind.ema_fast < ind.ema_mid && ind.ema_mid < ind.ema_slow) {
            return Err(ParamError::Inconsistent(format!(
                "EMA periods must increase: fast {} < mid {} < slow {}",
                ind.ema_fast, ind.ema_mid, ind.ema_slow
            )));
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(ParamError::Inconsistent(format!(
                "macd_fast {} must be < macd_slow {}",
                ind.macd_fast, ind.macd_slow
            )));
        }

        let wt = &self.wavetrend;
        check("wavetrend.channel_len", wt.channel_len as f64, 1.0, 200.0)?;
        check("wavetrend.average_len", wt.average_len as f64, 1.0, 200.0)?;
        check("wavetrend.overbought", wt.overbought, 0.0, 150.0)?;
        check("wavetrend.oversold", wt.oversold, -150.0, 0.0)?;
        check("wavetrend.oversold_lookback", wt.oversold_lookback as f64, 1.0, 50.0)?;

        let k = &self.kernel;
        check("kernel.bandwidth", k.bandwidth, 0.1, 100.0)?;
        check_window("kernel.lookback", k.lookback)?;
        check("kernel.std_multiplier", k.std_multiplier, 0.0, 10.0)?;

        let w = &self.trend_weights;
        check_unit("trend_weights.fast_above_mid", w.fast_above_mid)?;
        check_unit("trend_weights.mid_above_slow", w.mid_above_slow)?;
        check_unit("trend_weights.close_above_fast", w.close_above_fast)?;
        check_unit("trend_weights.ema", w.ema)?;
        check_unit("trend_weights.rsi", w.rsi)?;
        check_unit("trend_weights.wavetrend", w.wavetrend)?;

        let f = &self.filters;
        check("filters.volatility_ceiling", f.volatility_ceiling, 1e-6, 1.0)?;
        check("filters.std_ceiling", f.std_ceiling, 1e-6, 1.0)?;
        check_window("filters.volume_window", f.volume_window)?;
        check("filters.volume_floor", f.volume_floor, 0.0, 10.0)?;
        check("filters.volume_ceiling", f.volume_ceiling, 0.0, 100.0)?;
        check_window("filters.position_window", f.position_window)?;
        check("filters.price_position_ceiling", f.price_position_ceiling, 1e-6, 1.0)?;
        if f.volume_floor >= f.volume_ceiling {
            return Err(ParamError::Inconsistent(format!(
                "volume_floor {} must be < volume_ceiling {}",
                f.volume_floor, f.volume_ceiling
            )));
        }

        let e = &self.entry;
        check("entry.signal_memory", e.signal_memory as f64, 1.0, 100.0)?;
        check_rsi("entry.support_rsi_max", e.support_rsi_max)?;
        check_unit("entry.trend_strength_min", e.trend_strength_min)?;
        check_rsi("entry.rsi_entry_ceiling", e.rsi_entry_ceiling)?;

        let x = &self.exit;
        check_rsi("exit.rsi_exit_ceiling", x.rsi_exit_ceiling)?;
        check_unit("exit.trend_floor", x.trend_floor)?;
        check_unit("exit.profit_margin", x.profit_margin)?;
        check_rsi("exit.mid_rsi", x.mid_rsi)?;
        check("exit.volume_spike", x.volume_spike, 0.0, 100.0)?;
        check_unit("exit.resistance_ceiling", x.resistance_ceiling)?;

        let s = &self.stop;
        check("stop.atr_multiplier", s.atr_multiplier, 1e-6, 20.0)?;
        check("stop.floor", s.floor, 1e-6, 1.0)?;
        check("stop.ceiling", s.ceiling, 1e-6, 1.0)?;
        if s.floor > s.ceiling {
            return Err(ParamError::Inconsistent(format!(
                "stop floor {} must be <= ceiling {}",
                s.floor, s.ceiling
            )));
        }

        let m = &self.mtf;
        if !(m.entry < m.momentum && m.momentum < m.medium && m.medium < m.long) {
            return Err(ParamError::Inconsistent(format!(
                "timeframes must coarsen: entry {} < momentum {} < medium {} < long {}",
                m.entry, m.momentum, m.medium, m.long
            )));
        }
        check_unit("mtf.long_trend_min", m.long_trend_min)?;
        check_unit("mtf.medium_trend_min", m.medium_trend_min)?;
        check_rsi("mtf.momentum_rsi_min", m.momentum_rsi_min)?;
        check_rsi("mtf.precise_rsi_max", m.precise_rsi_max)?;

        check_unit("ml.min_probability", self.ml.min_probability)?;

        Ok(())
    }
}

//! WaveLab Core: indicators, WaveTrend/kernel signal fusion, quality filters,
//! dynamic stops and multi-timeframe confirmation.
//!
//! This crate is the signal-generation half of a trading system:
//! - Domain types (bars, validated price series, timeframes, resampling)
//! - Indicator library with NaN-for-undefined semantics
//! - Named-column indicator frame built in one ordered pass
//! - Trend-strength composite and quality filters
//! - Entry/exit fusion with explanatory tags, plus an ATR-scaled stop
//! - Multi-timeframe confirmation over resampled series
//! - An injected probability model gating entries
//!
//! Execution, accounting and order routing live in the host framework.

pub mod components;
pub mod domain;
pub mod fingerprint;
pub mod indicators;
pub mod ml;
pub mod mtf;
pub mod params;
pub mod pipeline;
pub mod strategy;

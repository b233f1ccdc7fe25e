//! Host-facing entry points.
//!
//! A host framework calls these four functions and nothing else:
//!
//! ```text
//! PriceSeries ──compute_indicators──▶ IndicatorFrame
//!                                        ├─compute_entry_signal──▶ EntryColumn
//!                                        ├─compute_exit_signal───▶ ExitColumn
//!                                        └─(row)─compute_dynamic_stop──▶ f64
//! ```
//!
//! All four are pure: the same inputs always give bit-identical outputs.

use tracing::info;

use crate::components::indicator::{FrameError, IndicatorFrame, IndicatorRow};
use crate::components::signal::{compute_entry, compute_exit, merge_flags, SignalFlags};
use crate::components::stop::{stop_column, stop_from_row};
use crate::domain::PriceSeries;
use crate::fingerprint::RunFingerprint;
use crate::ml::EvaluationContext;
use crate::params::{ParamError, StrategyParameters};

pub use crate::components::signal::{EntryColumn, ExitColumn};
pub use crate::pipeline::compute_indicators;

/// Long entry flags and tags for every bar of `frame`.
pub fn compute_entry_signal(
    frame: &IndicatorFrame,
    params: &StrategyParameters,
    ctx: &EvaluationContext,
) -> Result<EntryColumn, FrameError> {
    compute_entry(frame, params, ctx)
}

/// Long exit flags and tags for every bar of `frame`.
pub fn compute_exit_signal(
    frame: &IndicatorFrame,
    params: &StrategyParameters,
) -> Result<ExitColumn, FrameError> {
    compute_exit(frame, params)
}

/// Stop-loss for a position opened at `current_price`, as a negative fraction.
pub fn compute_dynamic_stop(
    row: &IndicatorRow,
    current_price: f64,
    params: &StrategyParameters,
) -> f64 {
    stop_from_row(row, current_price, &params.stop)
}

/// Everything one series evaluation produces.
#[derive(Debug, Clone)]
pub struct SeriesSignals {
    pub frame: IndicatorFrame,
    pub entries: EntryColumn,
    pub exits: ExitColumn,
    /// Stop at each bar, priced at that bar's close.
    pub stops: Vec<f64>,
    pub fingerprint: RunFingerprint,
}

impl SeriesSignals {
    pub fn flags(&self) -> Vec<SignalFlags> {
        merge_flags(&self.entries, &self.exits)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Params(#[from] ParamError),
}

/// Run the full pipeline over one series.
pub fn evaluate_series(
    series: &PriceSeries,
    params: &StrategyParameters,
    ctx: &EvaluationContext,
) -> Result<SeriesSignals, EvaluateError> {
    let fingerprint = RunFingerprint::new(series, params)?;
    let frame = compute_indicators(series, params)?;
    let entries = compute_entry_signal(&frame, params, ctx)?;
    let exits = compute_exit_signal(&frame, params)?;
    let stops = stop_column(&frame, &params.stop)?;

    info!(
        pair = series.pair(),
        timeframe = %series.timeframe(),
        variant = %params.variant,
        bars = series.len(),
        entries = entries.count(),
        exits = exits.count(),
        params_hash = %fingerprint.params_hash.short(),
        "series evaluated"
    );

    Ok(SeriesSignals {
        frame,
        entries,
        exits,
        stops,
        fingerprint,
    })
}

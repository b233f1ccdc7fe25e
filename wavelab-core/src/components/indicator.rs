//! Indicator trait and the named-column indicator frame.
//!
//! Indicators are pure functions: bar history in, numeric series out. A
//! frame collects their outputs under stable column names so that filters
//! and signal fusion never touch raw bars.

use crate::domain::Bar;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Trait for single-output indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later,
/// unless the indicator documents that it repaints (centered kernel smoothing).
pub trait Indicator: Send + Sync {
    /// Column name (e.g., "ema_21", "atr").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Canonical column names.
pub mod col {
    pub const CLOSE: &str = "close";
    pub const HIGH: &str = "high";
    pub const LOW: &str = "low";
    pub const VOLUME: &str = "volume";

    /// EMA columns are keyed by period (`ema_8`, `ema_21`, ...).
    pub fn ema(period: usize) -> String {
        format!("ema_{period}")
    }

    pub const RSI: &str = "rsi";
    pub const MACD: &str = "macd";
    pub const MACD_SIGNAL: &str = "macd_signal";
    pub const MACD_HIST: &str = "macd_hist";

    pub const BB_UPPER: &str = "bb_upper";
    pub const BB_MIDDLE: &str = "bb_middle";
    pub const BB_LOWER: &str = "bb_lower";

    pub const ATR: &str = "atr";
    pub const STD_CLOSE: &str = "std_close";
    pub const ROLLING_LOW: &str = "rolling_low";
    pub const ROLLING_HIGH: &str = "rolling_high";
    pub const VOLUME_SMA: &str = "volume_sma";
    pub const VOLUME_RATIO: &str = "volume_ratio";

    pub const WT1: &str = "wt1";
    pub const WT2: &str = "wt2";

    pub const NW_ESTIMATE: &str = "nw_estimate";
    pub const NW_UPPER: &str = "nw_upper";
    pub const NW_LOWER: &str = "nw_lower";

    pub const TREND_STRENGTH: &str = "trend_strength";
    pub const PRICE_POSITION: &str = "price_position";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("column '{0}' read before it was written")]
    MissingColumn(String),

    #[error("column '{name}' has {actual} values, frame has {expected} bars")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Named indicator columns aligned 1:1 with a price series.
///
/// Columns are kept in a `BTreeMap` so iteration (and therefore CSV output
/// and debug dumps) is deterministic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndicatorFrame {
    len: usize,
    columns: BTreeMap<String, Vec<f64>>,
}

impl IndicatorFrame {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            columns: BTreeMap::new(),
        }
    }

    /// Number of bars (rows).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Write a column. Overwrites an existing column of the same name.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), FrameError> {
        let name = name.into();
        if values.len() != self.len {
            return Err(FrameError::LengthMismatch {
                name,
                expected: self.len,
                actual: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Read a column that an earlier stage must have written.
    pub fn require(&self, name: &str) -> Result<&[f64], FrameError> {
        self.columns
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    }

    /// Value at a specific bar index. `None` if the column is missing or the
    /// index is out of bounds; `Some(NAN)` if the value is undefined.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.columns
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Snapshot of every column at `bar_index`.
    pub fn row(&self, bar_index: usize) -> Option<IndicatorRow> {
        if bar_index >= self.len {
            return None;
        }
        let values = self
            .columns
            .iter()
            .map(|(k, v)| (k.clone(), v[bar_index]))
            .collect();
        Some(IndicatorRow {
            index: bar_index,
            values,
        })
    }

    pub fn last_row(&self) -> Option<IndicatorRow> {
        self.len.checked_sub(1).and_then(|i| self.row(i))
    }

    /// Exact equality, treating NaN == NaN. Used for reproducibility checks.
    pub fn bitwise_eq(&self, other: &IndicatorFrame) -> bool {
        self.len == other.len
            && self.columns.len() == other.columns.len()
            && self.columns.iter().all(|(name, a)| {
                other.columns.get(name).is_some_and(|b| {
                    a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| x.to_bits() == y.to_bits())
                })
            })
    }
}

/// One bar's worth of indicator values.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorRow {
    pub index: usize,
    pub values: BTreeMap<String, f64>,
}

impl IndicatorRow {
    /// Value of `name`, or NaN when the column is absent.
    pub fn value(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(f64::NAN)
    }
}

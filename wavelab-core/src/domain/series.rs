//! PriceSeries: a validated, chronologically ordered run of bars.
//!
//! Validation happens once at construction. Everything downstream (indicators,
//! filters, fusion) can assume finite positive prices, non-negative volume,
//! consistent high/low ordering and strictly increasing timestamps.

use serde::Serialize;
use thiserror::Error;

use super::bar::{Bar, BarError};
use super::timeframe::Timeframe;

/// Malformed input detected at ingestion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} is invalid: {source}")]
    InvalidBar {
        index: usize,
        #[source]
        source: BarError,
    },

    #[error("timestamp at bar {index} does not increase ({current} <= {previous})")]
    NonMonotonicTimestamp {
        index: usize,
        previous: chrono::NaiveDateTime,
        current: chrono::NaiveDateTime,
    },

    #[error("series is empty")]
    Empty,
}

/// Bars for one (pair, timeframe) combination.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    pair: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Validate and wrap `bars`. Rejects empty input.
    pub fn new(
        pair: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> Result<Self, SeriesError> {
        if bars.is_empty() {
            return Err(SeriesError::Empty);
        }
        validate_bars(&bars)?;
        Ok(Self {
            pair: pair.into(),
            timeframe,
            bars,
        })
    }

    /// An empty series, for hosts that evaluate before the first bar arrives.
    pub fn empty(pair: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            pair: pair.into(),
            timeframe,
            bars: Vec::new(),
        }
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Prefix of the first `len` bars. Used by look-ahead tests and by hosts
    /// replaying history bar by bar.
    pub fn truncated(&self, len: usize) -> Self {
        Self {
            pair: self.pair.clone(),
            timeframe: self.timeframe,
            bars: self.bars[..len.min(self.bars.len())].to_vec(),
        }
    }

    /// Content hash of the series (pair, timeframe, every OHLCV field).
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.pair.as_bytes());
        hasher.update(self.timeframe.label().as_bytes());
        for bar in &self.bars {
            hasher.update(&bar.timestamp.and_utc().timestamp().to_le_bytes());
            for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
                hasher.update(&v.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Check every bar and the timestamp ordering.
pub fn validate_bars(bars: &[Bar]) -> Result<(), SeriesError> {
    for (index, bar) in bars.iter().enumerate() {
        bar.validate()
            .map_err(|source| SeriesError::InvalidBar { index, source })?;
        if index > 0 {
            let previous = bars[index - 1].timestamp;
            if bar.timestamp <= previous {
                return Err(SeriesError::NonMonotonicTimestamp {
                    index,
                    previous,
                    current: bar.timestamp,
                });
            }
        }
    }
    Ok(())
}

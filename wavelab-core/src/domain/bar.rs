//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single pair at a single timeframe.
///
/// `timestamp` is the bucket open time. Volume is a real number so that
/// fractional crypto volumes survive resampling without rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Why a single bar was rejected at ingestion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("non-finite {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("non-positive {field}: {value}")]
    NonPositivePrice { field: &'static str, value: f64 },

    #[error("negative volume: {0}")]
    NegativeVolume(f64),

    #[error("high {high} below max(open, close) {body_high}")]
    HighBelowBody { high: f64, body_high: f64 },

    #[error("low {low} above min(open, close) {body_low}")]
    LowAboveBody { low: f64, body_low: f64 },
}

impl Bar {
    /// Typical price `(high + low + close) / 3`.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Full OHLCV sanity check.
    pub fn validate(&self) -> Result<(), BarError> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (field, value) in prices {
            if !value.is_finite() {
                return Err(BarError::NonFinite { field, value });
            }
            if value <= 0.0 {
                return Err(BarError::NonPositivePrice { field, value });
            }
        }
        if !self.volume.is_finite() {
            return Err(BarError::NonFinite {
                field: "volume",
                value: self.volume,
            });
        }
        if self.volume < 0.0 {
            return Err(BarError::NegativeVolume(self.volume));
        }

        let body_high = self.open.max(self.close);
        let body_low = self.open.min(self.close);
        if self.high < body_high {
            return Err(BarError::HighBelowBody {
                high: self.high,
                body_high,
            });
        }
        if self.low > body_low {
            return Err(BarError::LowAboveBody {
                low: self.low,
                body_low,
            });
        }
        Ok(())
    }

    pub fn is_sane(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_rejects_nan_field() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(matches!(
            bar.validate(),
            Err(BarError::NonFinite { field: "open", .. })
        ));
    }

    #[test]
    fn bar_detects_insane_high() {
        let mut bar = sample_bar();
        bar.high = 102.0; // below close
        assert!(matches!(
            bar.validate(),
            Err(BarError::HighBelowBody { .. })
        ));
    }

    #[test]
    fn bar_detects_insane_low() {
        let mut bar = sample_bar();
        bar.low = 101.0; // above open
        assert!(matches!(bar.validate(), Err(BarError::LowAboveBody { .. })));
    }

    #[test]
    fn bar_rejects_negative_volume_and_zero_price() {
        let mut bar = sample_bar();
        bar.volume = -1.0;
        assert_eq!(bar.validate(), Err(BarError::NegativeVolume(-1.0)));

        let mut bar = sample_bar();
        bar.low = 0.0;
        assert!(matches!(
            bar.validate(),
            Err(BarError::NonPositivePrice { field: "low", .. })
        ));
    }

    #[test]
    fn typical_price() {
        let bar = sample_bar();
        assert!((bar.typical_price() - (105.0 + 98.0 + 103.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}

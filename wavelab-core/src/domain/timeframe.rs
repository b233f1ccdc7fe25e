//! Bar granularities and OHLCV resampling.
//!
//! Buckets are aligned to the Unix epoch: a 15m bucket always starts at
//! :00, :15, :30 or :45 regardless of where the source series begins.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::bar::Bar;
use super::series::{PriceSeries, SeriesError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 6] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    pub fn minutes(self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::minutes(self.minutes())
    }

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// Start of the bucket containing `ts`.
    pub fn bucket_start(self, ts: NaiveDateTime) -> NaiveDateTime {
        let secs = ts.and_utc().timestamp();
        let width = self.minutes() * 60;
        let start = secs.div_euclid(width) * width;
        ts - Duration::seconds(secs - start)
    }

    /// End (exclusive) of the bucket containing `ts`.
    pub fn bucket_end(self, ts: NaiveDateTime) -> NaiveDateTime {
        self.bucket_start(ts) + self.duration()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResampleError {
    #[error("cannot resample {source_tf} into finer timeframe {target}")]
    FinerTarget {
        source_tf: Timeframe,
        target: Timeframe,
    },

    #[error("unknown timeframe '{0}' (valid: 1m, 5m, 15m, 1h, 4h, 1d)")]
    Unknown(String),

    #[error(transparent)]
    Series(#[from] SeriesError),
}

impl FromStr for Timeframe {
    type Err = ResampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.label() == s)
            .ok_or_else(|| ResampleError::Unknown(s.to_string()))
    }
}

/// Aggregate `series` into `target` buckets.
///
/// open = first, high = max, low = min, close = last, volume = sum. The
/// resampled bar is stamped with its bucket start. A trailing partial bucket
/// is kept; consumers that must not see unfinished bars use
/// [`Timeframe::bucket_end`] to tell.
pub fn resample(series: &PriceSeries, target: Timeframe) -> Result<PriceSeries, ResampleError> {
    if target < series.timeframe() {
        return Err(ResampleError::FinerTarget {
            source_tf: series.timeframe(),
            target,
        });
    }
    if target == series.timeframe() {
        return Ok(series.clone());
    }
    if series.is_empty() {
        return Ok(PriceSeries::empty(series.pair(), target));
    }

    let mut out: Vec<Bar> = Vec::with_capacity(series.len() / 2 + 1);
    for bar in series.bars() {
        let start = target.bucket_start(bar.timestamp);
        match out.last_mut() {
            Some(agg) if agg.timestamp == start => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => out.push(Bar {
                timestamp: start,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            }),
        }
    }

    Ok(PriceSeries::new(series.pair(), target, out)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn minute_bars(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::minutes(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10.0 + i as f64,
            })
            .collect();
        PriceSeries::new("TEST", Timeframe::M1, bars).unwrap()
    }

    #[test]
    fn resample_ohlcv_rules() {
        let s = minute_bars(&[10.0, 12.0, 9.0, 11.0, 13.0, 14.0, 15.0]);
        let r = resample(&s, Timeframe::M5).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.timeframe(), Timeframe::M5);

        let first = &r.bars()[0];
        assert_eq!(first.open, 9.5);
        assert_eq!(first.high, 14.0); // max(high) = 13 + 1
        assert_eq!(first.low, 8.0); // min(low) = 9 - 1
        assert_eq!(first.close, 13.0);
        assert_eq!(first.volume, 10.0 + 11.0 + 12.0 + 13.0 + 14.0);

        // Partial trailing bucket.
        let second = &r.bars()[1];
        assert_eq!(second.open, 13.5);
        assert_eq!(second.close, 15.0);
        assert_eq!(second.volume, 15.0 + 16.0);
    }

    #[test]
    fn buckets_align_to_epoch() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 37, 0)
            .unwrap();
        let start = Timeframe::M15.bucket_start(ts);
        assert_eq!(start.format("%H:%M").to_string(), "10:30");
        assert_eq!(Timeframe::M15.bucket_end(ts).format("%H:%M").to_string(), "10:45");
        assert_eq!(Timeframe::H1.bucket_start(ts).format("%H:%M").to_string(), "10:00");
    }

    #[test]
    fn refuses_finer_target() {
        let s = resample(&minute_bars(&[1.0; 10]), Timeframe::M5).unwrap();
        let err = resample(&s, Timeframe::M1).unwrap_err();
        assert!(matches!(err, ResampleError::FinerTarget { .. }));
    }

    #[test]
    fn same_timeframe_is_identity() {
        let s = minute_bars(&[1.0, 2.0, 3.0]);
        let r = resample(&s, Timeframe::M1).unwrap();
        assert_eq!(r.bars(), s.bars());
    }

    #[test]
    fn parse_labels() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.label().parse::<Timeframe>().unwrap(), tf);
        }
        assert!("2m".parse::<Timeframe>().is_err());
    }
}

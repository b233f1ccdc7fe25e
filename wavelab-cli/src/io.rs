//! OHLCV CSV input and signal CSV output.
//!
//! Input columns: `timestamp,open,high,low,close,volume`. Timestamps are
//! RFC3339 (converted to UTC) or `%Y-%m-%d %H:%M:%S`.

use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

use wavelab_core::components::indicator::col;
use wavelab_core::domain::{Bar, PriceSeries, Timeframe};
use wavelab_core::mtf::MtfEvaluation;
use wavelab_core::strategy::SeriesSignals;

#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|_| anyhow!("unrecognized timestamp '{s}' (expected RFC3339 or YYYY-MM-DD HH:MM:SS)"))
}

/// Parse OHLCV rows. Line numbers in errors count the header as line 1.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for (i, row) in rdr.deserialize::<CsvBar>().enumerate() {
        let line = i + 2;
        let row = row.with_context(|| format!("line {line}: malformed row"))?;
        let timestamp = parse_timestamp(&row.timestamp).with_context(|| format!("line {line}"))?;
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    Ok(bars)
}

/// Load and validate a series. The pair name is the file stem.
pub fn load_series(path: &Path, timeframe: Timeframe) -> Result<PriceSeries> {
    let file = std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let bars = read_bars(file).with_context(|| format!("failed to parse {}", path.display()))?;
    let pair = file_stem(path);
    PriceSeries::new(pair, timeframe, bars).with_context(|| format!("invalid series in {}", path.display()))
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "series".to_string())
}

fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{v:.6}")
    }
}

/// Per-bar flags, tags and stop.
///
/// Columns: timestamp, close, trend_strength, enter_long, entry_tag,
/// exit_long, exit_tag, stop_loss
pub fn signals_csv(series: &PriceSeries, signals: &SeriesSignals) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "close",
        "trend_strength",
        "enter_long",
        "entry_tag",
        "exit_long",
        "exit_tag",
        "stop_loss",
    ])?;

    let trend = signals.frame.require(col::TREND_STRENGTH)?;
    for (i, bar) in series.bars().iter().enumerate() {
        let entry_tag = signals.entries.tag(i).map(|t| t.as_str()).unwrap_or("");
        let exit_tag = signals.exits.tag(i).map(|t| t.as_str()).unwrap_or("");
        wtr.write_record([
            bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            fmt_value(bar.close),
            fmt_value(trend[i]),
            u8::from(signals.entries.is_set(i)).to_string(),
            entry_tag.to_string(),
            u8::from(signals.exits.is_set(i)).to_string(),
            exit_tag.to_string(),
            fmt_value(signals.stops[i]),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush signals CSV")?;
    String::from_utf8(data).context("signals CSV is not valid UTF-8")
}

/// One row per entry bar with every role's reading.
pub fn mtf_csv(evaluations: &[MtfEvaluation]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for e in evaluations {
        wtr.serialize(e)?;
    }
    let data = wtr.into_inner().context("failed to flush MTF CSV")?;
    String::from_utf8(data).context("MTF CSV is not valid UTF-8")
}

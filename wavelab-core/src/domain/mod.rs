//! Domain types: bars, validated series, timeframes.

pub mod bar;
pub mod series;
pub mod timeframe;

pub use bar::{Bar, BarError};
pub use series::{PriceSeries, SeriesError};
pub use timeframe::{resample, ResampleError, Timeframe};

//! Signal components.
//!
//! Leaf to root:
//! - Indicator trait and the named-column `IndicatorFrame`
//! - Trend-strength composite
//! - Quality filters: volatility, volume, price position
//! - Entry/exit fusion with explanatory tags
//! - Dynamic stop-loss

pub mod composite;
pub mod filter;
pub mod indicator;
pub mod signal;
pub mod stop;

pub use composite::{trend_strength, trend_strength_at, TrendInputs};
pub use filter::{FilterEvaluation, FilterVerdict, QualityFilter};
pub use indicator::{col, FrameError, Indicator, IndicatorFrame, IndicatorRow};
pub use signal::{
    compute_entry, compute_exit, merge_flags, EntryColumn, EntryTag, ExitColumn, ExitTag,
    SignalColumn, SignalFlags,
};
pub use stop::{dynamic_stop, stop_column, stop_from_row};

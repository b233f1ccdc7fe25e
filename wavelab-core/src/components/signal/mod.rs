//! Entry/exit signal fusion.
//!
//! Signals are portfolio-agnostic: they read only the indicator frame and the
//! parameters, never position state. A fired bar always carries exactly one
//! tag explaining which rule produced it.

pub mod crossover;
pub mod entry;
pub mod exit;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an entry fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryTag {
    WaveKernelEntry,
    /// The ML gate participated and passed.
    WaveKernelMlEntry,
}

impl EntryTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaveKernelEntry => "wave_kernel_entry",
            Self::WaveKernelMlEntry => "wave_kernel_ml_entry",
        }
    }
}

/// Why an exit fired. Declaration order is evaluation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitTag {
    WtBearishCross,
    RsiOverbought,
    TrendDeterioration,
    ProfitTarget,
    NwResistance,
    VolumeSpike,
    PriceAtResistance,
}

impl ExitTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WtBearishCross => "wt_bearish_cross",
            Self::RsiOverbought => "rsi_overbought",
            Self::TrendDeterioration => "trend_deterioration",
            Self::ProfitTarget => "profit_target",
            Self::NwResistance => "nw_resistance",
            Self::VolumeSpike => "volume_spike",
            Self::PriceAtResistance => "price_at_resistance",
        }
    }
}

impl fmt::Display for EntryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ExitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One boolean per bar plus the tag of every fired bar.
///
/// `flags[i]` is true iff `tags[i]` is `Some`; `set` is the only writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalColumn<T> {
    flags: Vec<bool>,
    tags: Vec<Option<T>>,
}

pub type EntryColumn = SignalColumn<EntryTag>;
pub type ExitColumn = SignalColumn<ExitTag>;

impl<T: Copy> SignalColumn<T> {
    pub fn new(len: usize) -> Self {
        Self {
            flags: vec![false; len],
            tags: vec![None; len],
        }
    }

    pub fn set(&mut self, bar_index: usize, tag: T) {
        self.flags[bar_index] = true;
        self.tags[bar_index] = Some(tag);
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn is_set(&self, bar_index: usize) -> bool {
        self.flags.get(bar_index).copied().unwrap_or(false)
    }

    pub fn tag(&self, bar_index: usize) -> Option<T> {
        self.tags.get(bar_index).copied().flatten()
    }

    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    pub fn tags(&self) -> &[Option<T>] {
        &self.tags
    }

    pub fn fired_indices(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.then_some(i))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }
}

/// Per-bar view of the two signal columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalFlags {
    pub enter_long: bool,
    pub exit_long: bool,
    pub entry_tag: Option<EntryTag>,
    pub exit_tag: Option<ExitTag>,
}

pub fn merge_flags(entry: &EntryColumn, exit: &ExitColumn) -> Vec<SignalFlags> {
    (0..entry.len().max(exit.len()))
        .map(|i| SignalFlags {
            enter_long: entry.is_set(i),
            exit_long: exit.is_set(i),
            entry_tag: entry.tag(i),
            exit_tag: exit.tag(i),
        })
        .collect()
}

/// True if any flag in the trailing `memory` bars ending at `bar_index` is set.
pub(crate) fn fired_within(flags: &[bool], bar_index: usize, memory: usize) -> bool {
    flags[(bar_index + 1).saturating_sub(memory)..=bar_index]
        .iter()
        .any(|f| *f)
}

pub use crossover::{bearish_crossovers, bullish_crossovers};
pub use entry::{compute_entry, EntryConditions, EntryEvaluator};
pub use exit::{compute_exit, exit_tag_at, ExitInputs};

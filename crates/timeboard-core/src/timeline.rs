//! Timeline cell configuration and tick generation.

use crate::content::RichText;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Semantic step unit driving the tick step size.
///
/// Tick numbers are interpreted in days, so coarser granularities advance
/// by the corresponding day count unless a custom step overrides them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Granularity {
    /// One unit per tick.
    #[default]
    Units,
    Weeks,
    Months,
    Quarters,
    Years,
}

impl Granularity {
    /// Step size derived from the granularity.
    pub fn step(&self) -> i64 {
        match self {
            Granularity::Units => 1,
            Granularity::Weeks => 7,
            Granularity::Months => 30,
            Granularity::Quarters => 90,
            Granularity::Years => 365,
        }
    }
}

/// Layout direction of a timeline cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Per-tick label override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TickLabel {
    Plain(String),
    Rich(RichText),
}

impl TickLabel {
    pub fn plain_text(&self) -> String {
        match self {
            TickLabel::Plain(text) => text.clone(),
            TickLabel::Rich(content) => content.plain_text(),
        }
    }
}

/// Configuration of a numbered timeline ruler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub granularity: Granularity,
    /// Overrides the granularity-derived step when set.
    #[serde(default)]
    pub custom_step: Option<i64>,
    #[serde(default)]
    pub orientation: Orientation,
    /// Iterate from the high end down to the low end.
    #[serde(default)]
    pub reverse: bool,
    /// Keep every Nth tick only.
    #[serde(default = "default_display_every")]
    pub display_every: i64,
    /// Custom label overrides, keyed by tick number.
    #[serde(default)]
    pub labels: HashMap<i64, TickLabel>,
}

fn default_display_every() -> i64 {
    1
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

impl TimelineConfig {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            granularity: Granularity::default(),
            custom_step: None,
            orientation: Orientation::default(),
            reverse: false,
            display_every: 1,
            labels: HashMap::new(),
        }
    }

    /// Effective step, forced to at least 1 so iteration terminates.
    pub fn step(&self) -> i64 {
        self.custom_step.unwrap_or_else(|| self.granularity.step()).max(1)
    }

    /// Generate the displayed tick sequence.
    pub fn ticks(&self) -> Vec<i64> {
        let step = self.step();
        let every = self.display_every.max(1);
        let lo = self.start.min(self.end);
        let hi = self.start.max(self.end);

        let mut out = Vec::new();
        if self.reverse {
            let mut v = hi;
            while v >= lo {
                if (hi - v) % every == 0 {
                    out.push(v);
                }
                v -= step;
            }
        } else {
            let mut v = lo;
            while v <= hi {
                if (v - lo) % every == 0 {
                    out.push(v);
                }
                v += step;
            }
        }
        out
    }

    /// Number of displayed ticks; pin indices range over [0, tick_count).
    pub fn tick_count(&self) -> usize {
        self.ticks().len()
    }

    /// Display label for a tick: the override when present, else the number.
    pub fn label_for(&self, tick: i64) -> String {
        self.labels
            .get(&tick)
            .map(TickLabel::plain_text)
            .unwrap_or_else(|| tick.to_string())
    }
}

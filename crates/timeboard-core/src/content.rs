//! Canonical rich-text content model.
//!
//! A cell's content is a list of paragraphs, each an ordered list of styled
//! runs. Plain text is derived on demand; there is no second source of truth.

use crate::color::Rgba;
use serde::{Deserialize, Serialize};

/// Paragraph alignment.
///
/// `Justify` is accepted as a distinct value but lays out identically to
/// `Center` (no inter-word stretch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// A contiguous span of text sharing one formatting style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    /// Overrides the cell's base font size when set.
    #[serde(default)]
    pub font_size: Option<f64>,
    /// Overrides the cell's text color when set.
    #[serde(default)]
    pub color: Option<Rgba>,
}

impl TextRun {
    /// An unformatted run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// One paragraph: a hard line-break boundary carrying its alignment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
    #[serde(default)]
    pub alignment: Alignment,
    /// List-item paragraphs get a bullet glyph prefixed at layout time.
    #[serde(default)]
    pub list_item: bool,
}

impl Paragraph {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            runs: vec![TextRun::plain(text)],
            ..Self::default()
        }
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Structured rich-text content: ordered paragraphs of styled runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichText {
    pub paragraphs: Vec<Paragraph>,
}

impl RichText {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build unformatted content, splitting on newlines.
    pub fn plain(text: &str) -> Self {
        Self {
            paragraphs: text.split('\n').map(Paragraph::plain).collect(),
        }
    }

    /// Plain-text projection, paragraphs joined with newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when no paragraph carries any text.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(|p| p.text().is_empty())
    }

    /// Copy with all run-level formatting removed (paste-without-formatting).
    pub fn stripped(&self) -> Self {
        Self {
            paragraphs: self
                .paragraphs
                .iter()
                .map(|p| Paragraph {
                    runs: p
                        .runs
                        .iter()
                        .map(|r| TextRun::plain(r.text.clone()))
                        .collect(),
                    alignment: p.alignment,
                    list_item: p.list_item,
                })
                .collect(),
        }
    }

    /// Shift every explicit run-level font-size override by `delta`.
    pub fn adjust_font_sizes(&mut self, delta: f64, min: f64, max: f64) {
        for paragraph in &mut self.paragraphs {
            for run in &mut paragraph.runs {
                if let Some(size) = run.font_size.as_mut() {
                    *size = (*size + delta).clamp(min, max);
                }
            }
        }
    }
}

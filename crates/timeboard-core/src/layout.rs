//! Rich-text measurement and line layout.
//!
//! The interaction layer and the export rasterizer both lay text out
//! through this module, so what the user saw while editing is what the
//! flattened image shows. Measurement uses a deterministic per-character
//! advance table calibrated against the rendered families; it does not
//! depend on a font rasterizer.

use crate::cell::{CellStyle, FontFamily};
use crate::color::Rgba;
use crate::content::{Alignment, Paragraph, RichText, TextRun};

/// Leading factor applied to the tallest segment of a line.
pub const LINE_HEIGHT_FACTOR: f64 = 1.3;

/// Fixed horizontal inset from the cell border to the text block.
pub const TEXT_INSET: f64 = 8.0;

/// Bullet glyph prefixed to list-item paragraphs.
pub const BULLET: &str = "\u{2022} ";

/// Base font context of a cell, applied under run-level overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontContext {
    pub family: FontFamily,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
}

impl FontContext {
    pub fn from_style(style: &CellStyle) -> Self {
        Self {
            family: style.font_family,
            size: style.font_size,
            bold: style.bold,
            italic: style.italic,
        }
    }
}

/// Resolved style of a laid-out segment: run style OR-ed with the cell's
/// base bold/italic, run font size overriding the cell default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentStyle {
    pub family: FontFamily,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    /// Segment color override; None = cell text color.
    pub color: Option<Rgba>,
}

impl SegmentStyle {
    fn effective(run: &TextRun, font: &FontContext) -> Self {
        Self {
            family: font.family,
            size: run.font_size.unwrap_or(font.size),
            bold: run.bold || font.bold,
            italic: run.italic || font.italic,
            underline: run.underline,
            strikethrough: run.strikethrough,
            color: run.color,
        }
    }

    fn base(font: &FontContext) -> Self {
        Self {
            family: font.family,
            size: font.size,
            bold: font.bold,
            italic: font.italic,
            underline: false,
            strikethrough: false,
            color: None,
        }
    }
}

/// A drawable span: contiguous text of one style at an x-advance within
/// its line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub style: SegmentStyle,
    /// Offset from the line start.
    pub x: f64,
    pub width: f64,
}

/// One wrapped line of segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub segments: Vec<Segment>,
    pub width: f64,
    pub height: f64,
    pub alignment: Alignment,
}

/// Advance width of one character at the given style.
pub fn char_advance(c: char, style: &SegmentStyle) -> f64 {
    let factor = match style.family {
        FontFamily::Mono => 0.6,
        family => {
            let base = match c {
                'i' | 'j' | 'l' | 'I' | '\'' | '.' | ',' | ':' | ';' | '|' | '!' | ' ' => 0.3,
                'm' | 'w' | 'M' | 'W' | '@' => 0.85,
                c if c.is_ascii_uppercase() => 0.66,
                c if c.is_ascii_digit() => 0.55,
                _ => 0.52,
            };
            if family == FontFamily::Serif {
                base * 1.04
            } else {
                base
            }
        }
    };
    let weight = if style.bold { 1.05 } else { 1.0 };
    factor * weight * style.size
}

/// Pixel width of a string at the given style.
pub fn measure(text: &str, style: &SegmentStyle) -> f64 {
    text.chars().map(|c| char_advance(c, style)).sum()
}

/// Lay content out against a maximum line width.
///
/// Every paragraph is a hard break; greedy packing starts a new line when
/// the next word would overflow a non-empty line, so no word is ever
/// dropped. An empty paragraph still yields one empty line at the base
/// font size.
pub fn layout(content: &RichText, font: &FontContext, max_width: f64) -> Vec<Line> {
    let max_width = max_width.max(1.0);
    let mut lines = Vec::new();
    for paragraph in &content.paragraphs {
        layout_paragraph(paragraph, font, max_width, &mut lines);
    }
    if lines.is_empty() {
        lines.push(empty_line(font, Alignment::default()));
    }
    lines
}

/// Total laid-out height of the content; used by auto-fit.
pub fn content_height(content: &RichText, font: &FontContext, max_width: f64) -> f64 {
    layout(content, font, max_width).iter().map(|l| l.height).sum()
}

/// Horizontal offset of a line within the inner text box.
///
/// `Justify` centers the line as a block, same as `Center`; inter-word
/// stretch is not implemented.
pub fn line_offset(line: &Line, max_width: f64) -> f64 {
    match line.alignment {
        Alignment::Left => 0.0,
        Alignment::Right => (max_width - line.width).max(0.0),
        Alignment::Center | Alignment::Justify => ((max_width - line.width) / 2.0).max(0.0),
    }
}

fn empty_line(font: &FontContext, alignment: Alignment) -> Line {
    Line {
        segments: Vec::new(),
        width: 0.0,
        height: font.size * LINE_HEIGHT_FACTOR,
        alignment,
    }
}

/// Split a paragraph's runs into words, preserving a leading space on
/// every word but the first so inter-word spacing keeps its formatting.
fn split_words(paragraph: &Paragraph, font: &FontContext) -> Vec<(String, SegmentStyle)> {
    let mut words: Vec<(String, SegmentStyle)> = Vec::new();
    if paragraph.list_item {
        words.push((BULLET.to_string(), SegmentStyle::base(font)));
    }

    let mut pending_space = false;
    for run in &paragraph.runs {
        let style = SegmentStyle::effective(run, font);
        let mut current = String::new();
        for ch in run.text.chars() {
            if ch == ' ' {
                if !current.is_empty() {
                    push_word(&mut words, std::mem::take(&mut current), style, &mut pending_space);
                }
                pending_space = true;
            } else {
                current.push(ch);
            }
        }
        if !current.is_empty() {
            push_word(&mut words, current, style, &mut pending_space);
        }
    }
    words
}

fn push_word(
    words: &mut Vec<(String, SegmentStyle)>,
    word: String,
    style: SegmentStyle,
    pending_space: &mut bool,
) {
    let text = if *pending_space && !words.is_empty() {
        let mut spaced = String::with_capacity(word.len() + 1);
        spaced.push(' ');
        spaced.push_str(&word);
        spaced
    } else {
        word
    };
    *pending_space = false;
    words.push((text, style));
}

fn layout_paragraph(paragraph: &Paragraph, font: &FontContext, max_width: f64, out: &mut Vec<Line>) {
    let words = split_words(paragraph, font);
    if words.is_empty() {
        out.push(empty_line(font, paragraph.alignment));
        return;
    }

    let mut line_words: Vec<(String, SegmentStyle)> = Vec::new();
    let mut line_width = 0.0;
    for (text, style) in words {
        let width = measure(&text, &style);
        if !line_words.is_empty() && line_width + width > max_width {
            out.push(build_line(
                std::mem::take(&mut line_words),
                paragraph.alignment,
                font,
            ));
            // A word opening a new line sheds its leading space.
            let trimmed = text.trim_start_matches(' ').to_string();
            line_width = measure(&trimmed, &style);
            line_words.push((trimmed, style));
        } else {
            line_width += width;
            line_words.push((text, style));
        }
    }
    if !line_words.is_empty() {
        out.push(build_line(line_words, paragraph.alignment, font));
    }
}

/// Merge consecutive same-style words into segments and place them.
fn build_line(words: Vec<(String, SegmentStyle)>, alignment: Alignment, font: &FontContext) -> Line {
    let mut segments: Vec<Segment> = Vec::new();
    for (text, style) in words {
        match segments.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&text),
            _ => segments.push(Segment {
                text,
                style,
                x: 0.0,
                width: 0.0,
            }),
        }
    }

    let mut x = 0.0;
    let mut max_size: f64 = 0.0;
    for segment in &mut segments {
        segment.x = x;
        segment.width = measure(&segment.text, &segment.style);
        x += segment.width;
        max_size = max_size.max(segment.style.size);
    }
    if segments.is_empty() {
        max_size = font.size;
    }

    Line {
        segments,
        width: x,
        height: max_size * LINE_HEIGHT_FACTOR,
        alignment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> FontContext {
        FontContext {
            family: FontFamily::Sans,
            size: 16.0,
            bold: false,
            italic: false,
        }
    }

    #[test]
    fn test_single_line_fits() {
        let content = RichText::plain("hello world");
        let lines = layout(&content, &font(), 1000.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].segments.len(), 1);
        assert_eq!(lines[0].segments[0].text, "hello world");
    }

    #[test]
    fn test_wrapping_splits_words() {
        let content = RichText::plain("aaaa bbbb cccc dddd");
        let one_word = measure("aaaa", &SegmentStyle::base(&font()));
        // Room for roughly two words per line.
        let lines = layout(&content, &font(), one_word * 2.4);
        assert!(lines.len() >= 2);
        let rebuilt: String = lines
            .iter()
            .flat_map(|l| l.segments.iter().map(|s| s.text.trim().to_string()))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rebuilt.replace("  ", " "), "aaaa bbbb cccc dddd");
    }

    #[test]
    fn test_oversized_word_never_dropped() {
        let content = RichText::plain("tiny incomprehensibilities end");
        let lines = layout(&content, &font(), 40.0);
        let all: String = lines
            .iter()
            .flat_map(|l| l.segments.iter().map(|s| s.text.as_str()))
            .collect();
        assert!(all.contains("incomprehensibilities"));
        // The giant word sits alone on its own line.
        assert!(lines
            .iter()
            .any(|l| l.segments.len() == 1 && l.segments[0].text == "incomprehensibilities"));
    }

    #[test]
    fn test_empty_paragraph_yields_empty_line() {
        let content = RichText::plain("a\n\nb");
        let lines = layout(&content, &font(), 1000.0);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].segments.is_empty());
        assert!((lines[1].height - 16.0 * LINE_HEIGHT_FACTOR).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hard_breaks_between_paragraphs() {
        let content = RichText::plain("first\nsecond");
        let lines = layout(&content, &font(), 10_000.0);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_same_style_words_merge() {
        let content = RichText::plain("one two three");
        let lines = layout(&content, &font(), 10_000.0);
        assert_eq!(lines[0].segments.len(), 1);
    }

    #[test]
    fn test_style_change_splits_segments() {
        let content = RichText {
            paragraphs: vec![Paragraph {
                runs: vec![
                    TextRun::plain("plain "),
                    TextRun {
                        text: "bold".to_string(),
                        bold: true,
                        ..TextRun::default()
                    },
                ],
                ..Paragraph::default()
            }],
        };
        let lines = layout(&content, &font(), 10_000.0);
        assert_eq!(lines[0].segments.len(), 2);
        assert!(!lines[0].segments[0].style.bold);
        assert!(lines[0].segments[1].style.bold);
        // The space between the words travels with the bold word.
        assert_eq!(lines[0].segments[1].text, " bold");
    }

    #[test]
    fn test_cell_bold_ors_into_runs() {
        let mut base = font();
        base.bold = true;
        let content = RichText::plain("x");
        let lines = layout(&content, &base, 1000.0);
        assert!(lines[0].segments[0].style.bold);
    }

    #[test]
    fn test_run_size_override_drives_line_height() {
        let content = RichText {
            paragraphs: vec![Paragraph {
                runs: vec![
                    TextRun::plain("small "),
                    TextRun {
                        text: "big".to_string(),
                        font_size: Some(32.0),
                        ..TextRun::default()
                    },
                ],
                ..Paragraph::default()
            }],
        };
        let lines = layout(&content, &font(), 10_000.0);
        assert!((lines[0].height - 32.0 * LINE_HEIGHT_FACTOR).abs() < f64::EPSILON);
    }

    #[test]
    fn test_list_item_gets_bullet() {
        let content = RichText {
            paragraphs: vec![Paragraph {
                runs: vec![TextRun::plain("item")],
                list_item: true,
                ..Paragraph::default()
            }],
        };
        let lines = layout(&content, &font(), 10_000.0);
        assert!(lines[0].segments[0].text.starts_with(BULLET));
    }

    #[test]
    fn test_alignment_offsets() {
        let mut line = Line {
            segments: Vec::new(),
            width: 40.0,
            height: 20.0,
            alignment: Alignment::Left,
        };
        assert!((line_offset(&line, 100.0) - 0.0).abs() < f64::EPSILON);
        line.alignment = Alignment::Right;
        assert!((line_offset(&line, 100.0) - 60.0).abs() < f64::EPSILON);
        line.alignment = Alignment::Center;
        assert!((line_offset(&line, 100.0) - 30.0).abs() < f64::EPSILON);
        // Justify renders as a centered block.
        line.alignment = Alignment::Justify;
        assert!((line_offset(&line, 100.0) - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_content_single_line() {
        let lines = layout(&RichText::empty(), &font(), 100.0);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].segments.is_empty());
    }

    #[test]
    fn test_content_height_sums_lines() {
        let content = RichText::plain("a\nb\nc");
        let height = content_height(&content, &font(), 1000.0);
        assert!((height - 3.0 * 16.0 * LINE_HEIGHT_FACTOR).abs() < 1e-9);
    }
}

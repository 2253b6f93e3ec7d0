//! Styled links between cells.

use crate::cell::CellId;
use crate::color::Rgba;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for connections.
pub type ConnectionId = Uuid;

/// Stroke style of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkStyle {
    Dotted,
    Dashed,
    #[default]
    Solid,
    Bold,
    Arrow,
}

impl LinkStyle {
    /// Dash pattern for the rasterizer (None = solid stroke).
    pub fn dash_pattern(&self) -> Option<&'static [f64]> {
        match self {
            LinkStyle::Dotted => Some(&[2.0, 6.0]),
            LinkStyle::Dashed => Some(&[10.0, 6.0]),
            LinkStyle::Solid | LinkStyle::Bold | LinkStyle::Arrow => None,
        }
    }

    /// Stroke width used when the connection carries no explicit width.
    pub fn base_width(&self) -> f64 {
        match self {
            LinkStyle::Bold => 4.0,
            _ => 2.0,
        }
    }
}

/// A styled link between two cells, optionally anchored to timeline pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: CellId,
    pub target: CellId,
    /// Pin index on the source cell, meaningful only for timelines.
    #[serde(default)]
    pub source_pin: Option<usize>,
    /// Pin index on the target cell, meaningful only for timelines.
    #[serde(default)]
    pub target_pin: Option<usize>,
    #[serde(default)]
    pub color: Rgba,
    #[serde(default)]
    pub style: LinkStyle,
    #[serde(default)]
    pub stroke_width: Option<f64>,
}

impl Connection {
    pub fn new(source: CellId, target: CellId) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            target,
            source_pin: None,
            target_pin: None,
            color: Rgba::black(),
            style: LinkStyle::default(),
            stroke_width: None,
        }
    }

    pub fn with_pins(mut self, source_pin: Option<usize>, target_pin: Option<usize>) -> Self {
        self.source_pin = source_pin;
        self.target_pin = target_pin;
        self
    }

    pub fn with_style(mut self, style: LinkStyle) -> Self {
        self.style = style;
        self
    }

    /// Effective stroke width.
    pub fn line_width(&self) -> f64 {
        self.stroke_width.unwrap_or_else(|| self.style.base_width())
    }

    /// True if either endpoint references the given cell.
    pub fn touches(&self, id: CellId) -> bool {
        self.source == id || self.target == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_width_defaults() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let conn = Connection::new(a, b);
        assert!((conn.line_width() - 2.0).abs() < f64::EPSILON);

        let bold = Connection::new(a, b).with_style(LinkStyle::Bold);
        assert!((bold.line_width() - 4.0).abs() < f64::EPSILON);

        let mut custom = Connection::new(a, b);
        custom.stroke_width = Some(7.5);
        assert!((custom.line_width() - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_touches() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let conn = Connection::new(a, b);
        assert!(conn.touches(a));
        assert!(conn.touches(b));
        assert!(!conn.touches(c));
    }

    #[test]
    fn test_dash_patterns() {
        assert!(LinkStyle::Solid.dash_pattern().is_none());
        assert!(LinkStyle::Arrow.dash_pattern().is_none());
        assert!(LinkStyle::Dotted.dash_pattern().is_some());
        assert!(LinkStyle::Dashed.dash_pattern().is_some());
    }
}

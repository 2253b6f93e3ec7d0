//! Cell definitions for the board.

use crate::color::Rgba;
use crate::content::RichText;
use crate::timeline::TimelineConfig;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for cells.
pub type CellId = Uuid;

/// Group tag shared by cells arranged together.
pub type GroupId = Uuid;

/// Font family options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    /// Generic family name as used by the rasterizer.
    pub fn css_name(&self) -> &'static str {
        match self {
            FontFamily::Sans => "sans-serif",
            FontFamily::Serif => "serif",
            FontFamily::Mono => "monospace",
        }
    }
}

/// Style attributes shared by all cell kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    pub fill_color: Rgba,
    pub text_color: Rgba,
    pub border_color: Rgba,
    pub border_width: f64,
    /// Corner radius (0 = sharp corners).
    pub corner_radius: f64,
    pub font_family: FontFamily,
    pub font_size: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            fill_color: Rgba::white(),
            text_color: Rgba::black(),
            border_color: Rgba::black(),
            border_width: 2.0,
            corner_radius: 0.0,
            font_family: FontFamily::default(),
            font_size: Cell::DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
        }
    }
}

/// Shape of a connector-dot cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DotShape {
    #[default]
    Circle,
    Square,
    Diamond,
}

/// Normalized crop rectangle over an image payload, all fields in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for CropRect {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

impl CropRect {
    /// Clamp to the unit square with a non-degenerate extent.
    pub fn clamped(&self) -> Self {
        let x = self.x.clamp(0.0, 1.0);
        let y = self.y.clamp(0.0, 1.0);
        Self {
            x,
            y,
            width: self.width.clamp(0.01, 1.0 - x),
            height: self.height.clamp(0.01, 1.0 - y),
        }
    }
}

/// Encoded image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// Pixel payload of an image cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Base64-encoded image bytes.
    pub data_base64: String,
    pub format: ImageFormat,
    /// Source dimensions in pixels.
    pub source_width: u32,
    pub source_height: u32,
    #[serde(default)]
    pub crop: CropRect,
}

impl ImagePayload {
    /// Wrap raw encoded bytes handed over by the import collaborator.
    pub fn from_bytes(bytes: &[u8], format: ImageFormat, width: u32, height: u32) -> Self {
        Self {
            data_base64: BASE64_STANDARD.encode(bytes),
            format,
            source_width: width,
            source_height: height,
            crop: CropRect::default(),
        }
    }
}

/// Kind-specific payload of a cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Plain,
    Timeline(TimelineConfig),
    Dot(DotShape),
    Image(ImagePayload),
}

impl CellKind {
    pub fn is_timeline(&self) -> bool {
        matches!(self, CellKind::Timeline(_))
    }

    pub fn as_timeline(&self) -> Option<&TimelineConfig> {
        match self {
            CellKind::Timeline(cfg) => Some(cfg),
            _ => None,
        }
    }
}

/// A positioned, sized content element on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    /// Top-left corner position in world coordinates.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub content: RichText,
    #[serde(default)]
    pub style: CellStyle,
    #[serde(default)]
    pub kind: CellKind,
    #[serde(default)]
    pub group: Option<GroupId>,
    /// Set once the user resizes by hand; gates auto-fit-on-edit.
    #[serde(default)]
    pub manually_resized: bool,
}

impl Cell {
    /// Resize floor for cell width.
    pub const MIN_WIDTH: f64 = 50.0;
    /// Resize floor for cell height.
    pub const MIN_HEIGHT: f64 = 30.0;
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;

    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width: width.max(Self::MIN_WIDTH),
            height: height.max(Self::MIN_HEIGHT),
            content: RichText::empty(),
            style: CellStyle::default(),
            kind: CellKind::Plain,
            group: None,
            manually_resized: false,
        }
    }

    pub fn with_content(mut self, content: RichText) -> Self {
        self.content = content;
        self
    }

    pub fn with_kind(mut self, kind: CellKind) -> Self {
        self.kind = kind;
        self
    }

    /// Bounding rectangle in world coordinates.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Replace the cell's geometry from a rectangle.
    pub fn set_rect(&mut self, rect: Rect) {
        self.position = Point::new(rect.x0, rect.y0);
        self.width = rect.width();
        self.height = rect.height();
    }

    /// Check if a world-space point hits this cell.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.rect().inflate(tolerance, tolerance).contains(point)
    }

    /// Check if this cell's bounding box intersects a rectangle.
    pub fn intersects(&self, rect: Rect) -> bool {
        rect.intersect(self.rect()).area() > 0.0
    }

    /// Assign a fresh unique id (used when pasting clones).
    pub fn regenerate_id(&mut self) -> CellId {
        self.id = Uuid::new_v4();
        self.id
    }
}

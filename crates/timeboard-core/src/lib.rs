//! Timeboard Core Library
//!
//! Platform-agnostic document model, geometry and interaction logic for
//! the timeboard diagram/timeline canvas.

pub mod autosave;
pub mod camera;
pub mod cell;
pub mod color;
pub mod connection;
pub mod content;
pub mod document;
pub mod geometry;
pub mod history;
pub mod interaction;
pub mod layout;
pub mod timeline;

pub use autosave::SnapshotScheduler;
pub use camera::Camera;
pub use cell::{Cell, CellId, CellKind, CellStyle, DotShape, FontFamily, ImagePayload};
pub use color::Rgba;
pub use connection::{Connection, ConnectionId, LinkStyle};
pub use content::{Alignment, Paragraph, RichText, TextRun};
pub use document::{
    CellPatch, ConnectionPatch, Document, DocumentData, DocumentError, DocumentEvent,
};
pub use geometry::ResizeDirection;
pub use interaction::{Controller, ControllerSignal, Gesture, KeyCommand, Modifiers, PointerButton};
pub use timeline::{Granularity, Orientation, TickLabel, TimelineConfig};
